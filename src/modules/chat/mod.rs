use url::Url;

/// Address of the chat app for a logged-in session
pub fn chat_url(base: &str, session_id: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().append_pair("session_id", session_id);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url() {
        let url = chat_url("https://100096.pythonanywhere.com/chat/login/", "abc123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://100096.pythonanywhere.com/chat/login/?session_id=abc123"
        );
    }

    #[test]
    fn test_session_id_is_encoded() {
        let url = chat_url("https://chat.example.com/login/", "a b&c").unwrap();
        assert_eq!(url.query(), Some("session_id=a+b%26c"));
    }

    #[test]
    fn test_bad_base() {
        assert!(chat_url("not a url", "abc").is_err());
    }
}
