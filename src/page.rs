//! Diagnostic page served to browsers.
//!
//! Markup only; it has no part in the binary protocol beyond a small script
//! that posts a connection test and reads the errno back.

const TEMPLATE: &str = include_str!("page.html");

/// Facts shown in the "System Environment Test" table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFacts {
    pub version: String,
    pub platform: String,
    pub driver: String,
    pub driver_available: bool,
}

impl SystemFacts {
    /// Facts about the running binary.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            driver: "sqlx MySQL".to_string(),
            driver_available: true,
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn row(description: &str, ok: bool, result: &str) -> String {
    let class = if ok { "TestSucc" } else { "TestFail" };
    format!(
        "        <tr><td class=\"TestDesc\">{}</td><td class=\"{}\">{}</td></tr>\n",
        escape(description),
        class,
        escape(result)
    )
}

/// Render the full HTML page.
pub fn render_diagnostic_page(facts: &SystemFacts) -> String {
    let mut tests = String::new();
    tests.push_str(&row("ntunnel version", true, &facts.version));
    tests.push_str(&row("Platform", true, &facts.platform));
    tests.push_str(&row(
        &format!("{} driver available", facts.driver),
        facts.driver_available,
        if facts.driver_available { "Yes" } else { "No" },
    ));
    TEMPLATE.replace("{{system_tests}}", &tests)
}
