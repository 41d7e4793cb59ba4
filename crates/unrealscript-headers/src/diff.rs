//! Comparison of freshly generated class text against the previous header.
//!
//! Each class body brackets its members with `//## BEGIN PROPS <Name>` and
//! `//## END PROPS <Name>` lines. A class whose parent and member block are
//! unchanged keeps its native layout.

/// Marker line opening a class's member block.
pub fn begin_props_marker(class: &str) -> String {
    format!("//## BEGIN PROPS {}", class)
}

/// Marker line closing a class's member block.
pub fn end_props_marker(class: &str) -> String {
    format!("//## END PROPS {}", class)
}

/// Whether the previous header declares `class_cpp` with a different first
/// base class than `super_cpp`. A class missing from the previous header
/// counts as changed.
pub fn has_parent_class_changed(previous: &str, class_cpp: &str, super_cpp: &str) -> bool {
    let marker = format!("class {} : public ", class_cpp);
    let Some(start) = previous.find(&marker) else {
        return true;
    };
    let rest = &previous[start + marker.len()..];
    let line = rest.lines().next().unwrap_or("");
    let old_parent = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .next()
        .unwrap_or("");
    old_parent != super_cpp
}

/// The text between a class's property markers in `header`, excluding the
/// marker lines themselves.
pub fn props_block<'a>(header: &'a str, class: &str) -> Option<&'a str> {
    let begin = begin_props_marker(class);
    let end = end_props_marker(class);
    let mut offset = 0;
    let mut block_start = None;
    for line in header.split_inclusive('\n') {
        let trimmed = line.trim();
        match block_start {
            None if trimmed == begin => block_start = Some(offset + line.len()),
            Some(start) if trimmed == end => return Some(&header[start..offset]),
            _ => {}
        }
        offset += line.len();
    }
    None
}

/// Whether the member block of `class` in `previous` differs from
/// `new_block`. A class missing from the previous header counts as changed.
pub fn have_properties_changed(previous: &str, class: &str, new_block: &str) -> bool {
    match props_block(previous, class) {
        Some(old) => old != new_block,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREVIOUS: &str = "\
class APawn : public AActor, public IInteraction
{
public:
    //## BEGIN PROPS Pawn
    INT Health;
    BITFIELD bAlive:1;
    //## END PROPS Pawn

    DECLARE_CLASS(APawn,AActor,0,Engine)
};
";

    #[test]
    fn parent_compares_first_base_only() {
        assert!(!has_parent_class_changed(PREVIOUS, "APawn", "AActor"));
        assert!(has_parent_class_changed(PREVIOUS, "APawn", "AController"));
        assert!(has_parent_class_changed(PREVIOUS, "AHero", "APawn"));
    }

    #[test]
    fn props_block_excludes_markers() {
        let block = props_block(PREVIOUS, "Pawn").expect("block present");
        assert_eq!(block, "    INT Health;\n    BITFIELD bAlive:1;\n");
    }

    #[test]
    fn identical_block_is_unchanged() {
        assert!(!have_properties_changed(
            PREVIOUS,
            "Pawn",
            "    INT Health;\n    BITFIELD bAlive:1;\n"
        ));
        assert!(have_properties_changed(PREVIOUS, "Pawn", "    INT Health;\n"));
        assert!(have_properties_changed(PREVIOUS, "Hero", ""));
    }

    #[test]
    fn empty_block() {
        let header = "    //## BEGIN PROPS Empty\n    //## END PROPS Empty\n";
        assert_eq!(props_block(header, "Empty"), Some(""));
    }
}
