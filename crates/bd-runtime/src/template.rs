use std::sync::OnceLock;

use bd_core::{VarType, VariableStore};
use regex::{Captures, Regex};

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"(?i)\{(varglobal|var):([^:{}]*)(?::([^{}]*))?\}")
            .expect("template token regex must compile")
    })
}

fn is_speaker_token(name: &str) -> bool {
    let lowered = name.trim().to_lowercase();
    lowered == "speakername" || lowered == "speakersname"
}

/// Substitutes `{var:Name:Type}`, `{varGlobal:Name:Type}` and `{var:SpeakerName}`
/// tokens. Tokens that cannot be resolved (unknown variable, missing or unknown
/// type) are left in the output as written. Bools render lower-case, `true` or
/// `false`.
pub fn expand_template(
    text: &str,
    locals: &VariableStore,
    globals: &VariableStore,
    speaker_name: &str,
) -> String {
    token_regex()
        .replace_all(text, |captures: &Captures| {
            let token = &captures[0];
            let name = &captures[2];
            if is_speaker_token(name) {
                return speaker_name.to_string();
            }

            let Some(ty) = captures.get(3).and_then(|raw| VarType::parse_name(raw.as_str()))
            else {
                tracing::warn!(token, "template token has no usable type; left as written");
                return token.to_string();
            };
            let store = if captures[1].eq_ignore_ascii_case("varglobal") {
                globals
            } else {
                locals
            };
            match store.get(name, ty) {
                Some(value) => value.to_string(),
                None => {
                    tracing::warn!(token, "template token names an unknown variable");
                    token.to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod template_tests {
    use super::*;
    use bd_core::Variable;

    fn stores() -> (VariableStore, VariableStore) {
        let locals = VariableStore::from_variables(vec![
            Variable::new("coins").with_int(5),
            Variable::new("met").with_bool(true),
            Variable::new("ratio").with_float(0.5),
        ]);
        let globals = VariableStore::from_variables(vec![Variable::new("Hero").with_string("Ada")]);
        (locals, globals)
    }

    #[test]
    fn expands_local_int() {
        let (locals, globals) = stores();
        assert_eq!(
            expand_template("You have {var:coins:int} coins", &locals, &globals, "Bob"),
            "You have 5 coins"
        );
    }

    #[test]
    fn unknown_variable_is_left_unresolved() {
        let (locals, globals) = stores();
        assert_eq!(
            expand_template("Gems: {var:gems:int}", &locals, &globals, "Bob"),
            "Gems: {var:gems:int}"
        );
    }

    #[test]
    fn prefixes_and_types_ignore_case() {
        let (locals, globals) = stores();
        assert_eq!(
            expand_template(
                "{VarGlobal:hero:String} {VAR:Met:Bool} {var:ratio:FLOAT}",
                &locals,
                &globals,
                ""
            ),
            "Ada true 0.5"
        );
    }

    #[test]
    fn speaker_token_needs_no_type() {
        let (locals, globals) = stores();
        assert_eq!(
            expand_template(
                "{var:SpeakerName} / {var:speakersname} / {varGlobal:SpeakerName}",
                &locals,
                &globals,
                "Bob"
            ),
            "Bob / Bob / Bob"
        );
    }

    #[test]
    fn local_token_does_not_read_globals() {
        let (locals, globals) = stores();
        assert_eq!(
            expand_template("{var:Hero:string}", &locals, &globals, ""),
            "{var:Hero:string}"
        );
    }

    #[test]
    fn missing_or_unknown_type_keeps_token() {
        let (locals, globals) = stores();
        assert_eq!(
            expand_template("{var:coins} {var:coins:double}", &locals, &globals, ""),
            "{var:coins} {var:coins:double}"
        );
    }

    #[test]
    fn truncated_tokens_near_end_are_untouched() {
        let (locals, globals) = stores();
        assert_eq!(expand_template("{var:", &locals, &globals, ""), "{var:");
        assert_eq!(
            expand_template("x {var:coins:int", &locals, &globals, ""),
            "x {var:coins:int"
        );
        assert_eq!(expand_template("{var:coins:int}", &locals, &globals, ""), "5");
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let (locals, globals) = stores();
        assert_eq!(
            expand_template("{var:coins:int}+{var:coins:int}", &locals, &globals, ""),
            "5+5"
        );
    }
}
