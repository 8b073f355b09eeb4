//! Viewer JavaScript construction.
//!
//! Frame text is embedded as escaped string literals rather than spliced in
//! raw, so grid content can never terminate or corrupt the script.

/// Escape `s` into a double-quoted JavaScript string literal.
pub fn js_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Document-level script that swaps `field_name`'s value through `frames` at
/// `interval_ms`. When `autoplay` is false the loop waits for an explicit
/// `flipbookStart()` call (wired to a pushbutton).
pub fn animation_script(
    field_name: &str,
    frames: &[String],
    interval_ms: u32,
    autoplay: bool,
) -> String {
    let literals: Vec<String> = frames.iter().map(|f| js_string_literal(f)).collect();

    let mut js = String::new();
    js.push_str(&format!(
        "var flipbookFrames = [{}];\n",
        literals.join(", ")
    ));
    js.push_str("var flipbookIndex = 0;\n");
    js.push_str("var flipbookTimer = null;\n");
    js.push_str(&format!(
        "function flipbookTick() {{\n\
         \x20 flipbookIndex = (flipbookIndex + 1) % flipbookFrames.length;\n\
         \x20 var f = this.getField({field});\n\
         \x20 if (f != null) f.value = flipbookFrames[flipbookIndex];\n\
         }}\n",
        field = js_string_literal(field_name)
    ));
    js.push_str(&format!(
        "function flipbookStart() {{\n\
         \x20 if (flipbookTimer == null) {{\n\
         \x20   flipbookTimer = app.setInterval(\"flipbookTick()\", {interval_ms});\n\
         \x20 }}\n\
         }}\n"
    ));
    if autoplay {
        js.push_str("flipbookStart();\n");
    }
    js
}

/// Pushbutton script for static-button mode: advances an internal index and
/// reports it. Intentionally does not repaint the drawn raster.
pub fn advance_script(frame_count: usize) -> String {
    format!(
        "if (typeof flipbookStatic === \"undefined\") var flipbookStatic = 0;\n\
         flipbookStatic = (flipbookStatic + 1) % {frame_count};\n\
         app.alert(\"Frame \" + (flipbookStatic + 1) + \" of {frame_count}\", 3);\n"
    )
}

/// Script attached to the start button in non-autoplay scripted mode.
pub fn start_button_script() -> String {
    "flipbookStart();\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_escapes_quotes_backslashes_and_newlines() {
        assert_eq!(js_string_literal(r#"a"b\c"#), r#""a\"b\\c""#);
        assert_eq!(js_string_literal("x\ny"), r#""x\ny""#);
        assert_eq!(js_string_literal("x\r\t"), r#""x\r\t""#);
        assert_eq!(js_string_literal("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn animation_script_contains_all_frames_and_interval() {
        let frames = vec!["..\n@@".to_string(), "@@\n..".to_string()];
        let js = animation_script("anim_field", &frames, 250, true);

        assert!(js.contains(r#""..\n@@""#));
        assert!(js.contains(r#""@@\n..""#));
        assert!(js.contains("app.setInterval(\"flipbookTick()\", 250)"));
        assert!(js.contains("% flipbookFrames.length"));
        assert!(js.trim_end().ends_with("flipbookStart();"));
    }

    #[test]
    fn non_autoplay_script_does_not_self_start() {
        let js = animation_script("f", &["x".to_string()], 100, false);
        assert!(!js.trim_end().ends_with("flipbookStart();"));
        assert!(js.contains("function flipbookStart()"));
    }

    #[test]
    fn hostile_frame_text_cannot_break_out_of_the_literal() {
        let hostile = "\"; app.alert('pwn'); var x = \"".to_string();
        let js = animation_script("f", &[hostile], 100, true);
        // The payload survives only inside an escaped literal.
        assert!(js.contains(r#"\"; app.alert('pwn'); var x = \""#));
    }

    #[test]
    fn advance_script_wraps_modulo_frame_count() {
        let js = advance_script(7);
        assert!(js.contains("% 7"));
        assert!(js.contains("of 7"));
    }
}
