//! Media play/pause tracking.

use crate::core::handle::ListenerHandle;
use crate::core::hooks::Callback;
use crate::error::RecordResult;
use crate::host::events::{EventHandler, EventKind, HostEvent};
use crate::observer::ObserverContext;
use crate::record::{MediaInteraction, MediaInteractionRecord};
use std::rc::Rc;

pub fn observe_media_interactions(
    ctx: &Rc<ObserverContext>,
    cb: Callback<MediaInteractionRecord>,
) -> RecordResult<ListenerHandle> {
    let mut handles = Vec::new();
    for (kind, interaction) in [
        (EventKind::Play, MediaInteraction::Play),
        (EventKind::Pause, MediaInteraction::Pause),
    ] {
        let observer = ctx.clone();
        let cb = cb.clone();
        let handler: EventHandler = Rc::new(move |event: &HostEvent| {
            if observer.is_blocked(&event.target) {
                return Ok(());
            }
            cb(&MediaInteractionRecord {
                kind: interaction,
                id: observer.resolve_id(&event.target),
            })
        });
        handles.push(ctx.doc.add_event_listener(kind, handler));
    }

    Ok(ListenerHandle::combine(handles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecorderConfig;
    use crate::observer::test_support::*;
    use crate::policy::IdResolver;

    #[test]
    fn test_play_and_pause() {
        let fx = fixture(RecorderConfig::default());
        let video = attach(&fx, "video", &[]);
        let muted = attach(&fx, "audio", &[("class", "rr-block")]);
        let (cb, seen) = collect::<MediaInteractionRecord>();
        let handle = observe_media_interactions(&fx.ctx, cb).unwrap();

        fx.doc.play(&video).unwrap();
        fx.doc.play(&muted).unwrap();
        fx.doc.pause(&video).unwrap();

        let id = fx.mirror.resolve_id(&video);
        assert_eq!(
            *seen.borrow(),
            vec![
                MediaInteractionRecord {
                    kind: MediaInteraction::Play,
                    id,
                },
                MediaInteractionRecord {
                    kind: MediaInteraction::Pause,
                    id,
                },
            ]
        );

        handle.dispose();
        fx.doc.play(&video).unwrap();
        assert_eq!(seen.borrow().len(), 2);
    }
}
