//! Browser fingerprint patching.

/// Desktop Chrome on Windows.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Chromium flags needed to run inside containers and CI.
pub const LAUNCH_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
];

/// Injected before any page script runs.
pub const STEALTH_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', {
        get: () => false,
        configurable: true,
    });
    Object.defineProperty(navigator, 'languages', {
        get: () => ['zh-CN', 'zh', 'en'],
        configurable: true,
    });
})();
"#;
