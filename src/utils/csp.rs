use rand::{distributions::Alphanumeric, Rng};

const NONCE_LENGTH: usize = 10;

pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Content-Security-Policy for the embedded SumUp card widget.
pub fn widget_policy(nonce: &str) -> Vec<(&'static str, Vec<String>)> {
    let nonce_src = format!("'nonce-{nonce}'");
    let sources = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    vec![
        ("default-src", sources(&["'self'", "*.sumup.com", "*.google.com"])),
        (
            "script-src",
            [
                vec![nonce_src.clone()],
                sources(&["'self'", "*.sumup.com", "*.google.com", "'unsafe-inline'"]),
            ]
            .concat(),
        ),
        (
            "style-src",
            [
                sources(&["'self'"]),
                vec![nonce_src],
                sources(&[
                    "'unsafe-inline'",
                    "*.sumup.com",
                    "*.google.com",
                    "fonts.googleapis.com",
                ]),
            ]
            .concat(),
        ),
        (
            "img-src",
            sources(&["'self'", "*.google.com", "*.sumup.com", "*.gstatic.com", "data:"]),
        ),
        ("font-src", sources(&["'self'", "fonts.gstatic.com"])),
        ("frame-src", sources(&["*.sumup.com", "*.google.com", "*"])),
        ("connect-src", sources(&["'self'", "*.sumup.com", "*.google.com"])),
        ("frame-ancestors", sources(&["'self'"])),
    ]
}

/// `directive src src; directive src` with empty directives skipped.
pub fn render_policy(policy: &[(&str, Vec<String>)]) -> String {
    policy
        .iter()
        .filter(|(_, sources)| !sources.is_empty())
        .map(|(directive, sources)| format!("{} {}", directive, sources.join(" ")))
        .collect::<Vec<_>>()
        .join("; ")
}
