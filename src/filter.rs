use regex::Regex;

/// Decides which pages are captured with JavaScript turned off.
///
/// Built from a list of plain URL fragments such as `wikipedia.org` or
/// `eff.org/tags`; the fragments are escaped and joined into one alternation.
#[derive(Debug, Clone, Default)]
pub struct JsPolicy {
    regex: Option<Regex>,
}

impl JsPolicy {
    /// Compile a policy from URL fragments. Empty fragments are ignored.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, regex::Error> {
        let escaped: Vec<String> = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();

        if escaped.is_empty() {
            return Ok(Self { regex: None });
        }

        let regex = Regex::new(&format!("(?m){}", escaped.join("|")))?;
        Ok(Self { regex: Some(regex) })
    }

    /// Parse the `|` separated form, e.g. `wikipedia.org|eff.org/tags`
    pub fn from_list(list: &str) -> Result<Self, regex::Error> {
        let patterns: Vec<&str> = list.split('|').collect();
        Self::new(&patterns)
    }

    /// Whether JavaScript should be disabled while capturing `link`
    pub fn disable_js(&self, link: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(link),
            None => false,
        }
    }
}
