use fleetmail_protocol::model::{Category, Mode};
use std::collections::BTreeSet;

/// Next category after `current` in rotation order that is not disabled.
///
/// Falls back to `Online` once the order is used up, whether or not it is
/// disabled.
pub fn next_category(current: Category, disabled: &BTreeSet<Category>) -> Category {
    Category::ROTATION_ORDER
        .iter()
        .copied()
        .skip_while(|category| *category != current)
        .skip(1)
        .find(|category| !disabled.contains(category))
        .unwrap_or(Category::Online)
}

/// Operator-disabled categories plus the ones the mode cannot use.
pub fn disabled_for_mode(mode: Mode, operator_disabled: &BTreeSet<Category>) -> BTreeSet<Category> {
    let mut disabled = operator_disabled.clone();
    disabled.extend(
        Category::ROTATION_ORDER
            .iter()
            .copied()
            .filter(|category| !category.supports(mode)),
    );
    disabled
}
