//! Interpolación de `{{ .Var }}` en el boot command.
//!
//! Sólo variables simples; una variable desconocida o una llave sin cerrar
//! es error (el boot command tipeado a medias es peor que no tipearlo).

use indexmap::IndexMap;

use crate::error::BuildError;

pub fn render(template: &str, vars: &IndexMap<String, String>) -> Result<String, BuildError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let close = after.find("}}")
                         .ok_or_else(|| BuildError::Template(format!("unclosed '{{{{' in {template:?}")))?;
        let expr = after[..close].trim();
        let name = expr.strip_prefix('.')
                       .filter(|n| !n.is_empty())
                       .ok_or_else(|| BuildError::Template(format!("unsupported expression {{{{{expr}}}}}")))?;
        let value = vars.get(name)
                        .ok_or_else(|| BuildError::Template(format!("unknown variable .{name}")))?;
        out.push_str(value);
        rest = &after[close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> IndexMap<String, String> {
        let mut v = IndexMap::new();
        v.insert("HTTPIP".to_string(), "10.1.1.1".to_string());
        v.insert("HTTPPort".to_string(), "8123".to_string());
        v
    }

    #[test]
    fn substitutes_with_and_without_spaces() {
        let out = render("ks=http://{{ .HTTPIP }}:{{.HTTPPort}}/ks.cfg<enter>", &vars()).expect("render");
        assert_eq!(out, "ks=http://10.1.1.1:8123/ks.cfg<enter>");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(render("<esc><wait>linux", &vars()).expect("render"), "<esc><wait>linux");
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let err = render("{{ .Nope }}", &vars()).expect_err("debería fallar");
        assert!(err.to_string().contains("unknown variable .Nope"));
    }

    #[test]
    fn unclosed_braces_are_an_error() {
        assert!(render("{{ .HTTPIP ", &vars()).is_err());
    }
}
