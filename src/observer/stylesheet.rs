//! Stylesheet rule insertion and removal.

use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::error::RecordResult;
use crate::host::stylesheet::{DeleteRuleFn, InsertRuleFn, StyleSheet};
use crate::observer::ObserverContext;
use crate::record::{NodeId, StyleSheetRuleChange, MISSING_ID};
use std::rc::Rc;

fn owner_id(ctx: &ObserverContext, sheet: &StyleSheet) -> NodeId {
    sheet
        .owner_node()
        .map_or(MISSING_ID, |owner| ctx.resolve_id(&owner))
}

/// Wrap the document's `insertRule`/`deleteRule` so every edit on a sheet
/// with a known owner is recorded before it is applied.
///
/// The original method's result is returned unchanged. Edits on sheets whose
/// owner has no id are applied but not recorded. Teardown reinstalls the
/// original methods.
pub fn observe_style_sheet_rules(
    ctx: &Rc<ObserverContext>,
    cb: Callback<StyleSheetRuleChange>,
) -> RecordResult<ListenerHandle> {
    let methods = ctx.doc.style_sheet_methods();

    let original_insert = methods.insert_rule();
    let insert: InsertRuleFn = {
        let observer = ctx.clone();
        let cb = cb.clone();
        let original = original_insert.clone();
        Rc::new(move |sheet: &StyleSheet, rule: &str, index: Option<usize>| {
            let id = owner_id(&observer, sheet);
            if id != MISSING_ID {
                cb(&StyleSheetRuleChange::added(id, rule, index))?;
            }
            original(sheet, rule, index)
        })
    };

    let original_delete = methods.delete_rule();
    let delete: DeleteRuleFn = {
        let observer = ctx.clone();
        let original = original_delete.clone();
        Rc::new(move |sheet: &StyleSheet, index: usize| {
            let id = owner_id(&observer, sheet);
            if id != MISSING_ID {
                cb(&StyleSheetRuleChange::removed(id, index))?;
            }
            original(sheet, index)
        })
    };

    methods.replace_insert_rule(insert);
    methods.replace_delete_rule(delete);

    let doc = Rc::downgrade(&ctx.doc);
    Ok(ListenerHandle::new(move || {
        if let Some(doc) = doc.upgrade() {
            let methods = doc.style_sheet_methods();
            methods.replace_insert_rule(original_insert);
            methods.replace_delete_rule(original_delete);
        }
    }))
}
