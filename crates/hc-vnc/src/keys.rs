//! Boot command -> eventos de teclado.
//!
//! El string se consume de izquierda a derecha:
//! - `<wait>`, `<wait5>`, `<wait10>` pausan 1/5/10 s sin emitir teclas;
//! - las teclas con nombre (`<enter>`, `<f5>`, `<pageUp>`, ...) son un
//!   press+release de su keysym;
//! - cualquier otro carácter es un code point; mayúsculas y los símbolos de
//!   `SHIFTED_CHARS` van envueltos en shift-down/shift-up.
//!
//! Tras cada transición (shift-down, key-down, key-up, shift-up) se espera
//! `key_delay`: más rápido que eso el buffer del teclado remoto descarta
//! eventos.

use std::io;
use std::thread;
use std::time::Duration;

use log::debug;

pub const KEY_LEFT_SHIFT: u32 = 0xFFE1;
pub const KEY_DELAY: Duration = Duration::from_millis(100);

const SHIFTED_CHARS: &str = "~!@#$%^&*()_+{}|:\"<>?";

const WAITS: &[(&str, Duration)] = &[("<wait>", Duration::from_secs(1)),
                                     ("<wait5>", Duration::from_secs(5)),
                                     ("<wait10>", Duration::from_secs(10))];

// keysyms X11
const NAMED_KEYS: &[(&str, u32)] = &[("<bs>", 0xFF08),
                                     ("<del>", 0xFFFF),
                                     ("<enter>", 0xFF0D),
                                     ("<esc>", 0xFF1B),
                                     ("<f1>", 0xFFBE),
                                     ("<f2>", 0xFFBF),
                                     ("<f3>", 0xFFC0),
                                     ("<f4>", 0xFFC1),
                                     ("<f5>", 0xFFC2),
                                     ("<f6>", 0xFFC3),
                                     ("<f7>", 0xFFC4),
                                     ("<f8>", 0xFFC5),
                                     ("<f9>", 0xFFC6),
                                     ("<f10>", 0xFFC7),
                                     ("<f11>", 0xFFC8),
                                     ("<f12>", 0xFFC9),
                                     ("<return>", 0xFF0D),
                                     ("<tab>", 0xFF09),
                                     ("<up>", 0xFF52),
                                     ("<down>", 0xFF54),
                                     ("<left>", 0xFF51),
                                     ("<right>", 0xFF53),
                                     ("<spacebar>", 0x20),
                                     ("<insert>", 0xFF63),
                                     ("<home>", 0xFF50),
                                     ("<end>", 0xFF57),
                                     ("<pageUp>", 0xFF55),
                                     ("<pageDown>", 0xFF56)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Wait(Duration),
    Key { keysym: u32, shift: bool },
}

/// Tokeniza un comando completo. Nunca falla: un `<` que no abre un token
/// conocido se tipea como carácter literal.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        if c == '<' {
            if let Some((name, pause)) = WAITS.iter().find(|(name, _)| rest.starts_with(name)) {
                tokens.push(Token::Wait(*pause));
                rest = &rest[name.len()..];
                continue;
            }
            if let Some((name, keysym)) = NAMED_KEYS.iter().find(|(name, _)| rest.starts_with(name)) {
                tokens.push(Token::Key { keysym: *keysym,
                                         shift: false });
                rest = &rest[name.len()..];
                continue;
            }
        }
        tokens.push(Token::Key { keysym: c as u32,
                                 shift: c.is_uppercase() || SHIFTED_CHARS.contains(c) });
        rest = &rest[c.len_utf8()..];
    }
    tokens
}

/// Destino de eventos de teclado (una conexión RFB, o un registro en tests).
pub trait KeyboardSink {
    fn key_event(&mut self, keysym: u32, down: bool) -> io::Result<()>;

    /// Espera real entre eventos; los tests la sobreescriben para no dormir.
    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

fn press<K: KeyboardSink + ?Sized>(sink: &mut K, keysym: u32, down: bool, key_delay: Duration) -> io::Result<()> {
    sink.key_event(keysym, down)?;
    sink.pause(key_delay);
    Ok(())
}

/// Tipea `text` en `sink`.
pub fn type_string<K: KeyboardSink + ?Sized>(sink: &mut K, text: &str, key_delay: Duration) -> io::Result<()> {
    for token in tokenize(text) {
        match token {
            Token::Wait(pause) => {
                debug!("boot command wait {pause:?}");
                sink.pause(pause);
            }
            Token::Key { keysym, shift } => {
                debug!("sending keysym {keysym:#x} shift={shift}");
                if shift {
                    press(sink, KEY_LEFT_SHIFT, true, key_delay)?;
                }
                press(sink, keysym, true, key_delay)?;
                press(sink, keysym, false, key_delay)?;
                if shift {
                    press(sink, KEY_LEFT_SHIFT, false, key_delay)?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char, shift: bool) -> Token {
        Token::Key { keysym: c as u32,
                     shift }
    }

    #[test]
    fn unknown_angle_token_is_literal() {
        assert_eq!(tokenize("<foo>"),
                   vec![key('<', true), key('f', false), key('o', false), key('o', false), key('>', true)]);
    }

    #[test]
    fn function_keys_do_not_shadow_each_other() {
        assert_eq!(tokenize("<f1><f10>"),
                   vec![Token::Key { keysym: 0xFFBE,
                                     shift: false },
                        Token::Key { keysym: 0xFFC7,
                                     shift: false }]);
    }

    #[test]
    fn waits_are_recognized() {
        assert_eq!(tokenize("<wait5><wait10>"),
                   vec![Token::Wait(Duration::from_secs(5)), Token::Wait(Duration::from_secs(10))]);
    }

    #[test]
    fn non_ascii_is_one_code_point() {
        assert_eq!(tokenize("ñÉ"), vec![key('ñ', false), key('É', true)]);
    }
}
