use winit::keyboard::{Key, NamedKey};

/// Browser-style name of a logical key: characters lower-cased, `" "` for
/// space, named keys lower-cased ("enter", "arrowleft").
pub fn key_name(key: &Key) -> Option<String> {
    match key {
        Key::Character(text) => Some(text.to_lowercase()),
        Key::Named(NamedKey::Space) => Some(" ".to_string()),
        Key::Named(named) => Some(format!("{named:?}").to_lowercase()),
        _ => None,
    }
}
