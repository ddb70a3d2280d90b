//! 富文本内容的纯文本呈现
//!
//! 备注内容可能由富文本编辑器写入 HTML。前端不直接插入 HTML，
//! 而是去掉标签后按纯文本显示；块级结束标签和 `<br>` 转为换行。

/// 把 HTML 片段转为纯文本
pub fn to_plain_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find('<') {
        out.push_str(&decode_entities(&rest[..start]));
        let Some(end) = rest[start..].find('>') else {
            // 未闭合的 `<` 按普通文本处理
            out.push_str(&decode_entities(&rest[start..]));
            rest = "";
            break;
        };
        if breaks_line(&rest[start + 1..start + end]) && !out.ends_with('\n') {
            out.push('\n');
        }
        rest = &rest[start + end + 1..];
    }
    out.push_str(&decode_entities(rest));
    out.trim().to_string()
}

fn breaks_line(tag: &str) -> bool {
    let tag = tag.trim().trim_end_matches('/').trim().to_ascii_lowercase();
    let name = tag.split_whitespace().next().unwrap_or("");
    matches!(
        name,
        "br" | "/p" | "/div" | "/li" | "/h1" | "/h2" | "/h3" | "/h4" | "/blockquote"
    )
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(to_plain_text("Llamar al perito\nantes del lunes"), "Llamar al perito\nantes del lunes");
    }

    #[test]
    fn test_tags_removed_and_blocks_become_lines() {
        let html = "<p>Revisar <b>pericia</b></p><ul><li>Punto 1</li><li>Punto 2</li></ul>";
        assert_eq!(to_plain_text(html), "Revisar pericia\nPunto 1\nPunto 2");
        assert_eq!(to_plain_text("uno<br>dos<br/>tres"), "uno\ndos\ntres");
    }

    #[test]
    fn test_script_markup_is_not_kept() {
        let html = "<img src=x onerror=\"alert(1)\">Nota &amp; anexo &lt;2&gt;";
        assert_eq!(to_plain_text(html), "Nota & anexo <2>");
    }

    #[test]
    fn test_unclosed_bracket_kept_as_text() {
        assert_eq!(to_plain_text("monto < 500"), "monto < 500");
    }
}
