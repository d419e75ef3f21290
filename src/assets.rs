use rust_embed::RustEmbed;
use std::borrow::Cow;
use tankarena::{LevelData, LevelLoadError};

#[derive(RustEmbed)]
#[folder = "levels/"]
pub struct Levels;

pub fn get_level_bytes(name: &str) -> Option<Cow<'static, [u8]>> {
    Levels::get(name).map(|f| f.data)
}

/// Embedded level file names in play order.
pub fn level_names() -> Vec<String> {
    let mut names: Vec<String> = Levels::iter().map(|n| n.into_owned()).collect();
    names.sort();
    names
}

pub fn level_count() -> usize {
    level_names().len()
}

/// Parses the embedded level at `index`, or `None` past the last one.
pub fn load_embedded_level(index: usize) -> Option<Result<LevelData, LevelLoadError>> {
    let names = level_names();
    let name = names.get(index)?;
    let bytes = get_level_bytes(name)?;
    let text = String::from_utf8_lossy(&bytes);
    Some(LevelData::parse(&text).map(|level| level.with_index(index)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_levels_parse() {
        assert!(level_count() >= 2);
        for index in 0..level_count() {
            let level = load_embedded_level(index).unwrap().unwrap();
            assert_eq!(level.index, index);
            level.validate().unwrap();
        }
        assert!(load_embedded_level(level_count()).is_none());
    }
}
