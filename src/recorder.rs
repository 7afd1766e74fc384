//! The recorder facade: collaborators, sink and lifecycle in one place.

use crate::config::RecorderConfig;
use crate::core::handle::ListenerHandle;
use crate::core::hooks::{Callbacks, HookSet};
use crate::core::timer::SharedScheduler;
use crate::error::{RecordError, RecordResult};
use crate::host::document::Document;
use crate::observer::{init_observers, ObserverContext};
use crate::policy::{BlockPredicate, ClassBlockPredicate, NodeMirror, SimpleMutationSerializer};
use std::cell::RefCell;
use std::rc::Rc;

/// Records one document into one set of callbacks.
///
/// Built with the default collaborators ([`NodeMirror`], [`ClassBlockPredicate`],
/// the configured [`MaskInputOptions`](crate::policy::MaskInputOptions) and
/// [`SimpleMutationSerializer`]) unless a full [`ObserverContext`] is supplied.
/// Recording stops when the recorder is dropped.
pub struct Recorder {
    ctx: Rc<ObserverContext>,
    mirror: Option<Rc<NodeMirror>>,
    callbacks: Callbacks,
    hooks: HookSet,
    teardown: RefCell<Option<ListenerHandle>>,
}

impl Recorder {
    pub fn new(
        doc: Rc<Document>,
        scheduler: SharedScheduler,
        config: RecorderConfig,
        callbacks: Callbacks,
    ) -> Self {
        let mirror = Rc::new(NodeMirror::new());
        let blocker: Rc<dyn BlockPredicate> = Rc::new(ClassBlockPredicate);
        let serializer = Rc::new(SimpleMutationSerializer::new(
            mirror.clone(),
            blocker.clone(),
            &config.block_class,
        ));
        let ctx = ObserverContext {
            doc,
            scheduler,
            ids: mirror.clone(),
            blocker,
            masking: Rc::new(config.mask_inputs.clone()),
            serializer,
            config,
        };

        let mut recorder = Self::with_context(Rc::new(ctx), callbacks);
        recorder.mirror = Some(mirror);
        recorder
    }

    /// Use caller-supplied collaborators.
    pub fn with_context(ctx: Rc<ObserverContext>, callbacks: Callbacks) -> Self {
        Self {
            ctx,
            mirror: None,
            callbacks,
            hooks: HookSet::default(),
            teardown: RefCell::new(None),
        }
    }

    /// Auxiliary hooks to run ahead of the callbacks, from the next start on.
    pub fn with_hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Start every observation source.
    ///
    /// With the default collaborators, nodes already in the document are
    /// assigned ids first.
    pub fn start(&self) -> RecordResult<()> {
        if self.is_running() {
            return Err(RecordError::AlreadyRunning);
        }
        if let Some(ref mirror) = self.mirror {
            mirror.track_subtree(self.ctx.doc.root());
        }

        let teardown = init_observers(&self.ctx, self.callbacks.clone(), &self.hooks)?;
        *self.teardown.borrow_mut() = Some(teardown);

        tracing::info!("Recording started");
        Ok(())
    }

    /// Stop every source and discard pending flushes. No-op when stopped.
    pub fn stop(&self) {
        let Some(teardown) = self.teardown.borrow_mut().take() else {
            return;
        };
        teardown.dispose();
        tracing::info!("Recording stopped");
    }

    pub fn is_running(&self) -> bool {
        self.teardown.borrow().is_some()
    }

    pub fn context(&self) -> &Rc<ObserverContext> {
        &self.ctx
    }

    /// The id mirror, when built with the default collaborators.
    pub fn mirror(&self) -> Option<&Rc<NodeMirror>> {
        self.mirror.as_ref()
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timer::ManualScheduler;
    use crate::host::events::EventKind;
    use crate::policy::IdResolver;
    use crate::record::RecordedEvent;

    fn recorder_with_log() -> (Rc<Document>, Recorder, Rc<RefCell<Vec<RecordedEvent>>>) {
        let doc = Document::new();
        let html = doc.create_element("html");
        doc.append_child(doc.root(), &html);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let callbacks = Callbacks::from_fn(move |event| {
            sink.borrow_mut().push(event);
            Ok(())
        });
        let recorder = Recorder::new(
            doc.clone(),
            ManualScheduler::new(),
            RecorderConfig::default(),
            callbacks,
        );
        (doc, recorder, seen)
    }

    #[test]
    fn test_start_stop_lifecycle() {
        let (doc, recorder, seen) = recorder_with_log();
        assert!(!recorder.is_running());

        recorder.start().unwrap();
        assert!(recorder.is_running());
        assert_eq!(recorder.start(), Err(RecordError::AlreadyRunning));

        let html = doc.document_element().unwrap();
        assert_ne!(recorder.mirror().unwrap().resolve_id(&html), -1);

        doc.pointer(EventKind::Click, &html, 3.0, 4.0).unwrap();
        assert_eq!(seen.borrow().len(), 1);

        recorder.stop();
        recorder.stop();
        assert!(!recorder.is_running());
        assert_eq!(doc.listener_count(), 0);

        doc.pointer(EventKind::Click, &html, 3.0, 4.0).unwrap();
        assert_eq!(seen.borrow().len(), 1);

        // Restartable after a stop.
        recorder.start().unwrap();
        doc.pointer(EventKind::Click, &html, 3.0, 4.0).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn test_drop_stops_recording() {
        let (doc, recorder, _seen) = recorder_with_log();
        recorder.start().unwrap();
        assert!(doc.listener_count() > 0);

        drop(recorder);
        assert_eq!(doc.listener_count(), 0);
        assert_eq!(doc.mutation_observer_count(), 0);
    }
}
