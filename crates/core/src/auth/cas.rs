//! CAS 2.0 protocol helpers.
//!
//! The server is only asked two things: where to send the browser to log
//! in, and whether a service ticket is valid. The validation answer is a
//! small XML document:
//!
//! ```xml
//! <cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
//!   <cas:authenticationSuccess>
//!     <cas:user>d12345a</cas:user>
//!     <cas:attributes><cas:name>Jane Doe</cas:name></cas:attributes>
//!   </cas:authenticationSuccess>
//! </cas:serviceResponse>
//! ```

use url::Url;

use super::{AuthError, CasIdentity, Result};

fn endpoint(cas_url: &str, path: &str) -> Result<Url> {
    let base = if cas_url.ends_with('/') {
        cas_url.to_string()
    } else {
        format!("{cas_url}/")
    };
    Url::parse(&base)
        .and_then(|base| base.join(path))
        .map_err(|e| AuthError::Provider(format!("invalid CAS url {cas_url}: {e}")))
}

/// `{cas_url}/login?service=...`
pub fn cas_login_url(cas_url: &str, service: &str) -> Result<Url> {
    let mut url = endpoint(cas_url, "login")?;
    url.query_pairs_mut().append_pair("service", service);
    Ok(url)
}

/// `{cas_url}/serviceValidate?ticket=...&service=...`
pub fn cas_validate_url(cas_url: &str, ticket: &str, service: &str) -> Result<Url> {
    let mut url = endpoint(cas_url, "serviceValidate")?;
    url.query_pairs_mut()
        .append_pair("ticket", ticket)
        .append_pair("service", service);
    Ok(url)
}

/// Finds the first `<{prefix}:{tag} ...>` element, whatever its namespace
/// prefix (or none), and returns its attributes and raw inner content.
fn element<'a>(xml: &'a str, tag: &str) -> Option<(&'a str, &'a str)> {
    let mut from = 0;
    while let Some(pos) = xml[from..].find('<') {
        let name_start = from + pos + 1;
        from = name_start;
        let rest = &xml[name_start..];
        if rest.starts_with(['/', '!', '?']) {
            continue;
        }
        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let qualified = &rest[..name_len];
        let local = qualified.rsplit(':').next().unwrap_or(qualified);
        if local != tag {
            continue;
        }

        let tag_end = name_start + rest.find('>')?;
        if xml[..tag_end].ends_with('/') {
            return Some((&xml[name_start + name_len..tag_end - 1], ""));
        }
        let attrs = &xml[name_start + name_len..tag_end];
        let body_start = tag_end + 1;
        let close = format!("</{qualified}>");
        let body_end = body_start + find_outside_cdata(&xml[body_start..], &close)?;
        return Some((attrs, &xml[body_start..body_end]));
    }
    None
}

/// Like `str::find`, but ignores matches inside `<![CDATA[...]]>` sections.
fn find_outside_cdata(haystack: &str, needle: &str) -> Option<usize> {
    let mut from = 0;
    loop {
        let hit = from + haystack[from..].find(needle)?;
        match haystack[from..hit].find("<![CDATA[") {
            Some(open) => {
                let open = from + open;
                from = open + haystack[open..].find("]]>")? + 3;
            }
            None => return Some(hit),
        }
    }
}

fn unescape_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let Some(semi) = rest.find(';') else {
            break;
        };
        let entity = &rest[1..semi];
        let decoded = match entity {
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "amp" => Some('&'),
            _ => entity
                .strip_prefix("#x")
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Text content of an element: entities decoded, CDATA kept verbatim.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find("<![CDATA[") {
        out.push_str(&unescape_entities(&rest[..open]));
        let body = &rest[open + "<![CDATA[".len()..];
        match body.find("]]>") {
            Some(close) => {
                out.push_str(&body[..close]);
                rest = &body[close + 3..];
            }
            None => {
                out.push_str(body);
                rest = "";
            }
        }
    }
    out.push_str(&unescape_entities(rest));
    out.trim().to_string()
}

fn attribute(attrs: &str, name: &str) -> Option<String> {
    let key = format!("{name}=\"");
    let start = attrs.find(&key)? + key.len();
    let end = start + attrs[start..].find('"')?;
    Some(unescape(&attrs[start..end]))
}

/// Parses a `serviceValidate` response.
pub fn parse_service_response(xml: &str) -> Result<CasIdentity> {
    if let Some((attrs, body)) = element(xml, "authenticationFailure") {
        return Err(AuthError::CasFailure {
            code: attribute(attrs, "code").unwrap_or_default(),
            message: unescape(body),
        });
    }

    let (_, success) = element(xml, "authenticationSuccess")
        .ok_or_else(|| AuthError::MalformedResponse("no authentication result".to_string()))?;

    let netid = element(success, "netid")
        .or_else(|| element(success, "user"))
        .map(|(_, text)| unescape(text))
        .filter(|netid| !netid.is_empty())
        .ok_or_else(|| AuthError::MalformedResponse("missing user".to_string()))?;
    let name = element(success, "name")
        .map(|(_, text)| unescape(text))
        .filter(|name| !name.is_empty());

    Ok(CasIdentity { netid, name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_login_and_validate_urls() {
        let login = cas_login_url(
            "https://login.example.edu/cas",
            "http://localhost:3000/auth/callback?next=/db/",
        )
        .unwrap();
        assert_eq!(
            login.as_str(),
            "https://login.example.edu/cas/login?service=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback%3Fnext%3D%2Fdb%2F"
        );

        let validate = cas_validate_url("https://login.example.edu/cas/", "ST-1", "http://x/cb").unwrap();
        assert_eq!(validate.path(), "/cas/serviceValidate");
        let pairs: Vec<(String, String)> = validate.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("ticket".to_string(), "ST-1".to_string()),
                ("service".to_string(), "http://x/cb".to_string()),
            ]
        );
    }

    #[test]
    fn parses_success_with_name() {
        let xml = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
            <cas:authenticationSuccess>
                <cas:user>Jane Doe@DARTMOUTH.EDU</cas:user>
                <cas:attributes>
                    <cas:name>Jane O&apos;Doe</cas:name>
                    <cas:netid>d12345a</cas:netid>
                </cas:attributes>
            </cas:authenticationSuccess>
        </cas:serviceResponse>"#;
        let identity = parse_service_response(xml).unwrap();
        assert_eq!(identity.netid, "d12345a");
        assert_eq!(identity.name.as_deref(), Some("Jane O'Doe"));
    }

    #[test]
    fn falls_back_to_user_without_netid_attribute() {
        let xml = "<cas:serviceResponse><cas:authenticationSuccess><cas:user>d12345a</cas:user></cas:authenticationSuccess></cas:serviceResponse>";
        let identity = parse_service_response(xml).unwrap();
        assert_eq!(identity.netid, "d12345a");
        assert_eq!(identity.name, None);
    }

    #[test]
    fn reports_failures() {
        let xml = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
            <cas:authenticationFailure code="INVALID_TICKET">
                Ticket ST-1 not recognized
            </cas:authenticationFailure>
        </cas:serviceResponse>"#;
        match parse_service_response(xml) {
            Err(AuthError::CasFailure { code, message }) => {
                assert_eq!(code, "INVALID_TICKET");
                assert_eq!(message, "Ticket ST-1 not recognized");
            }
            other => panic!("unexpected {other:?}"),
        }

        assert!(matches!(
            parse_service_response("<html>oops</html>"),
            Err(AuthError::MalformedResponse(_))
        ));
    }

    #[test]
    fn accepts_any_namespace_prefix_and_cdata() {
        let xml = r#"<sso:serviceResponse xmlns:sso="http://www.yale.edu/tp/cas">
            <sso:authenticationSuccess>
                <sso:user><![CDATA[d12345a]]></sso:user>
                <sso:attributes>
                    <sso:name><![CDATA[Jane <Doe> & Co]]> &#39;Jr&#x27;</sso:name>
                </sso:attributes>
            </sso:authenticationSuccess>
        </sso:serviceResponse>"#;
        let identity = parse_service_response(xml).unwrap();
        assert_eq!(identity.netid, "d12345a");
        assert_eq!(identity.name.as_deref(), Some("Jane <Doe> & Co 'Jr'"));

        let bare = "<serviceResponse><authenticationSuccess><user>f00abcd</user></authenticationSuccess></serviceResponse>";
        assert_eq!(parse_service_response(bare).unwrap().netid, "f00abcd");
    }

    #[test]
    fn cdata_may_contain_closing_tag_text() {
        let xml = "<cas:name><![CDATA[a</cas:name>b]]></cas:name>";
        assert_eq!(element(xml, "name").map(|(_, t)| unescape(t)), Some("a</cas:name>b".to_string()));
    }

    #[test]
    fn self_closing_element_is_empty() {
        let xml = r#"<cas:authenticationFailure code="INVALID_SERVICE"/>"#;
        match parse_service_response(xml) {
            Err(AuthError::CasFailure { code, message }) => {
                assert_eq!(code, "INVALID_SERVICE");
                assert_eq!(message, "");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn element_skips_longer_tag_names() {
        let xml = "<cas:username>nope</cas:username><cas:user>yes</cas:user>";
        assert_eq!(element(xml, "user").map(|(_, t)| t), Some("yes"));
    }
}
