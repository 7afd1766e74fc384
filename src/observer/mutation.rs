//! Structural change observation.

use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::error::RecordResult;
use crate::host::document::MutationHandler;
use crate::host::mutation::MutationRecord;
use crate::observer::ObserverContext;
use crate::record::MutationBatch;
use std::rc::Rc;

/// Serialize each batch of structural changes and pass it on.
pub fn observe_mutations(
    ctx: &Rc<ObserverContext>,
    cb: Callback<MutationBatch>,
) -> RecordResult<ListenerHandle> {
    let serializer = ctx.serializer.clone();
    let handler: MutationHandler = Rc::new(move |records: &[MutationRecord]| {
        match serializer.serialize(records) {
            Some(batch) => cb(&batch),
            None => Ok(()),
        }
    });
    Ok(ctx.doc.observe_mutations(handler))
}
