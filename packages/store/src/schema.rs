//! Parent/child validity rules between flavours

use crate::Flavour;

/// Whether a block of flavour `child` may live directly under `parent`
pub fn can_contain(parent: &Flavour, child: &Flavour) -> bool {
    match parent {
        Flavour::Page => matches!(child, Flavour::Note | Flavour::Surface),
        Flavour::Note | Flavour::Paragraph | Flavour::List => is_content(child),
        Flavour::Surface => matches!(
            child,
            Flavour::Image | Flavour::Attachment | Flavour::Bookmark | Flavour::Embed(_)
        ),
        Flavour::Database => matches!(child, Flavour::Paragraph),
        _ => false,
    }
}

/// Content flavours: anything that is not a page, note or surface
pub fn is_content(flavour: &Flavour) -> bool {
    !matches!(flavour, Flavour::Page | Flavour::Note | Flavour::Surface)
}
