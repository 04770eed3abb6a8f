//! Header, cookie and body rewriting for the login proxy.
//!
//! All rewriting is literal substring replacement. Pages reference the login
//! host in three spellings (`https://`, JSON-escaped `https:\/\/`, and
//! protocol-relative `//`) and every one must point back at the proxy.

/// Host serving the login pages.
pub const LOGIN_HOST: &str = "accounts.google.com";

/// Cookie carrying the one-time login token.
pub const LOGIN_COOKIE: &str = "oauth_token";

/// Static-asset hosts whose URLs are rewritten into `/gproxy/`.
pub const REWRITTEN_STATIC_DOMAINS: &[&str] = &[
    "ssl.gstatic.com",
    "www.gstatic.com",
    "fonts.gstatic.com",
    "fonts.googleapis.com",
    "apis.google.com",
    "ogs.google.com",
    "play.google.com",
    "myaccount.google.com",
    "lh3.googleusercontent.com",
];

/// Hosts the static proxy relays by exact match.
const ALLOWED_STATIC_DOMAINS: &[&str] = &[
    "ssl.gstatic.com",
    "www.gstatic.com",
    "fonts.gstatic.com",
    "fonts.googleapis.com",
    "apis.google.com",
    "www.google.com",
    "play.google.com",
    "lh3.googleusercontent.com",
    "accounts.youtube.com",
    "myaccount.google.com",
    "ogs.google.com",
    "clients1.google.com",
    "signaler-pa.clients6.google.com",
    "content-autofill.googleapis.com",
];

/// Parent domains the static proxy relays by suffix.
const ALLOWED_STATIC_SUFFIXES: &[&str] = &[
    ".google.com",
    ".gstatic.com",
    ".googleapis.com",
    ".googleusercontent.com",
];

/// Response headers never relayed by the login proxy.
pub const DROPPED_LOGIN_HEADERS: &[&str] = &[
    "set-cookie",
    "content-security-policy",
    "x-frame-options",
    "content-length",
    "content-encoding",
    "strict-transport-security",
    "x-content-type-options",
];

/// Response headers never relayed by the static proxy.
pub const DROPPED_STATIC_HEADERS: &[&str] = &[
    "content-security-policy",
    "x-frame-options",
    "strict-transport-security",
];

/// Hop-by-hop headers, owned by each connection.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "upgrade",
    "proxy-connection",
];

/// Whether the static proxy may relay `domain`.
pub fn is_allowed_static_domain(domain: &str) -> bool {
    let domain = domain.to_ascii_lowercase();
    ALLOWED_STATIC_DOMAINS.contains(&domain.as_str())
        || ALLOWED_STATIC_SUFFIXES
            .iter()
            .any(|suffix| domain.ends_with(suffix))
}

/// Point login-host and static-asset URLs in `content` at `base`.
pub fn rewrite_body(content: &str, base: &str) -> String {
    let mut out = replace_variants(content, LOGIN_HOST, base, "glogin", false);
    for domain in REWRITTEN_STATIC_DOMAINS {
        out = replace_variants(&out, domain, base, "gproxy", true);
    }
    out
}

fn replace_variants(content: &str, host: &str, base: &str, prefix: &str, keep_host: bool) -> String {
    let (plain, escaped) = if keep_host {
        (
            format!("{base}/{prefix}/{host}"),
            format!("{base}\\/{prefix}\\/{host}"),
        )
    } else {
        (format!("{base}/{prefix}"), format!("{base}\\/{prefix}"))
    };

    content
        .replace(&format!("https://{host}"), &plain)
        .replace(&format!("https:\\/\\/{host}"), &escaped)
        .replace(&format!("//{host}"), &plain)
}

/// Rewrite a redirect target on the login host to go through the proxy.
pub fn rewrite_location(location: &str, base: &str) -> String {
    let local = format!("{base}/glogin");
    location
        .replacen(&format!("https://{LOGIN_HOST}"), &local, 1)
        .replacen(&format!("http://{LOGIN_HOST}"), &local, 1)
}

/// Rewrite a `Referer` from the proxy back to the upstream origin.
pub fn rewrite_referer(referer: &str, base: &str, upstream_origin: &str) -> String {
    referer.replacen(&format!("{base}/glogin"), upstream_origin, 1)
}

/// Drop every `attr` or `attr=...` segment from a `Set-Cookie` value.
pub fn remove_cookie_attr(set_cookie: &str, attr: &str) -> String {
    set_cookie
        .split(';')
        .filter(|part| {
            let trimmed = part.trim();
            let is_attr = trimmed.eq_ignore_ascii_case(attr)
                || trimmed
                    .split_once('=')
                    .is_some_and(|(name, _)| name.trim().eq_ignore_ascii_case(attr));
            !is_attr
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Make a `Set-Cookie` usable over plain HTTP on localhost.
pub fn localize_set_cookie(set_cookie: &str) -> String {
    ["Domain", "Secure", "SameSite"]
        .iter()
        .fold(set_cookie.to_string(), |sc, attr| remove_cookie_attr(&sc, attr))
}

/// Value of cookie `name` in a `Set-Cookie` header, if non-empty.
pub fn extract_cookie_value<'a>(set_cookie: &'a str, name: &str) -> Option<&'a str> {
    set_cookie.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key == name && !value.is_empty()).then_some(value)
    })
}

/// Insert `tag` before `</head>`, else before `<body`, else at the start.
pub fn inject_script(html: &str, tag: &str) -> String {
    let at = html.find("</head>").or_else(|| html.find("<body")).unwrap_or(0);
    let mut out = String::with_capacity(html.len() + tag.len());
    out.push_str(&html[..at]);
    out.push_str(tag);
    out.push_str(&html[at..]);
    out
}

/// How a proxied response body is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Rewritten, with the bridge injected.
    Html,
    /// Rewritten.
    Text,
    /// Relayed untouched.
    Binary,
}

impl BodyKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("text/html") {
            BodyKind::Html
        } else if ct.contains("javascript") || ct.contains("text/plain") {
            BodyKind::Text
        } else {
            BodyKind::Binary
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8080";

    #[test]
    fn test_rewrite_all_login_variants() {
        let html = r#"<a href="https://accounts.google.com/foo">a</a>
<script>var u = "https:\/\/accounts.google.com\/foo";</script>
<img src="//accounts.google.com/foo">"#;
        let out = rewrite_body(html, BASE);

        assert!(out.contains(r#"href="http://localhost:8080/glogin/foo""#));
        assert!(out.contains(r#""http://localhost:8080\/glogin\/foo""#));
        assert!(out.contains(r#"src="http://localhost:8080/glogin/foo""#));
        assert!(!out.contains("accounts.google.com"));
    }

    #[test]
    fn test_rewrite_static_domains() {
        let css = "url(https://fonts.gstatic.com/s/a.woff) url(//ssl.gstatic.com/x.png) \"https:\\/\\/apis.google.com\\/js\"";
        let out = rewrite_body(css, BASE);

        assert!(out.contains("url(http://localhost:8080/gproxy/fonts.gstatic.com/s/a.woff)"));
        assert!(out.contains("url(http://localhost:8080/gproxy/ssl.gstatic.com/x.png)"));
        assert!(out.contains("\"http://localhost:8080\\/gproxy\\/apis.google.com\\/js\""));
    }

    #[test]
    fn test_rewrite_leaves_other_hosts() {
        let text = "https://example.com/a and https://www.google.com/b";
        assert_eq!(rewrite_body(text, BASE), text);
    }

    #[test]
    fn test_rewrite_location() {
        assert_eq!(
            rewrite_location("https://accounts.google.com/signin/v2?x=1", BASE),
            "http://localhost:8080/glogin/signin/v2?x=1"
        );
        assert_eq!(
            rewrite_location("http://accounts.google.com/", BASE),
            "http://localhost:8080/glogin/"
        );
        assert_eq!(
            rewrite_location("https://myaccount.google.com/", BASE),
            "https://myaccount.google.com/"
        );
    }

    #[test]
    fn test_rewrite_referer() {
        assert_eq!(
            rewrite_referer(
                "http://localhost:8080/glogin/EmbeddedSetup?x",
                BASE,
                "https://accounts.google.com"
            ),
            "https://accounts.google.com/EmbeddedSetup?x"
        );
    }

    #[test]
    fn test_localize_set_cookie() {
        let sc = "oauth_token=abc; Domain=.google.com; Path=/; Secure; HttpOnly; SameSite=None";
        assert_eq!(localize_set_cookie(sc), "oauth_token=abc; Path=/; HttpOnly");
    }

    #[test]
    fn test_remove_cookie_attr_case_insensitive() {
        assert_eq!(remove_cookie_attr("a=1; secure; path=/", "Secure"), "a=1; path=/");
        assert_eq!(remove_cookie_attr("a=1; DOMAIN=x", "Domain"), "a=1");
    }

    #[test]
    fn test_extract_cookie_value() {
        let sc = "oauth_token=oauth2_4/xyz; Path=/; HttpOnly";
        assert_eq!(extract_cookie_value(sc, LOGIN_COOKIE), Some("oauth2_4/xyz"));
        assert_eq!(extract_cookie_value("oauth_token=; Path=/", LOGIN_COOKIE), None);
        assert_eq!(extract_cookie_value("NID=1; Path=/", LOGIN_COOKIE), None);
        assert_eq!(extract_cookie_value("x_oauth_token=1", LOGIN_COOKIE), None);
    }

    #[test]
    fn test_inject_script_positions() {
        let tag = "<script>x</script>";
        assert_eq!(
            inject_script("<html><head><title>t</title></head><body></body>", tag),
            "<html><head><title>t</title><script>x</script></head><body></body>"
        );
        assert_eq!(
            inject_script("<html><body class=a>hi</body>", tag),
            "<html><script>x</script><body class=a>hi</body>"
        );
        assert_eq!(inject_script("<p>bare</p>", tag), "<script>x</script><p>bare</p>");
    }

    #[test]
    fn test_static_allow_list() {
        assert!(is_allowed_static_domain("ssl.gstatic.com"));
        assert!(is_allowed_static_domain("accounts.youtube.com"));
        assert!(is_allowed_static_domain("foo.googleusercontent.com"));
        assert!(is_allowed_static_domain("x.clients6.google.com"));
        assert!(!is_allowed_static_domain("evil.com"));
        assert!(!is_allowed_static_domain("google.com.evil.com"));
        assert!(!is_allowed_static_domain("youtube.com"));
    }

    #[test]
    fn test_body_kind() {
        assert_eq!(BodyKind::from_content_type("text/html; charset=utf-8"), BodyKind::Html);
        assert_eq!(BodyKind::from_content_type("application/javascript"), BodyKind::Text);
        assert_eq!(BodyKind::from_content_type("text/plain"), BodyKind::Text);
        assert_eq!(BodyKind::from_content_type("image/png"), BodyKind::Binary);
        assert_eq!(BodyKind::from_content_type("text/css"), BodyKind::Binary);
    }
}
