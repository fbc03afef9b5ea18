/// Substitutes `${name}` placeholders in a signature template. Unknown
/// placeholders are left untouched so a template typo shows up verbatim in
/// the rendered signature instead of failing the whole run.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match vars.iter().find(|(name, _)| *name == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str("${");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// SnappyMail stores signatures as rich text; line breaks become `<br>`.
pub fn to_html_breaks(text: &str) -> String {
    text.replace("\r\n", "<br>").replace('\n', "<br>")
}
