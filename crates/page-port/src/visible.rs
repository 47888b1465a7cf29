//! Geometry/style visibility test shared by every layer above the port.

use crate::model::ElementSnapshot;

/// A control counts as visible when it has a non-zero box and none of the
/// style switches that hide it. File inputs are the one scanner-level
/// exception to this test; that exception lives in the scanner, not here.
pub fn is_visible(snapshot: &ElementSnapshot) -> bool {
    snapshot.rect.width > 0.0
        && snapshot.rect.height > 0.0
        && snapshot.style.display != "none"
        && snapshot.style.visibility != "hidden"
        && snapshot.style.opacity > 0.0
}
