//! Hardware interrupt (ATTN) rearm logic.
//!
//! The ATTN line is one-shot: after it fires for an inbound note, it must
//! be explicitly rearmed or the next arrival goes unsignaled. Rearming is
//! scoped to the inbound notefile so unrelated Notecard events don't wake
//! the host.

use log::{error, trace};

use crate::note::{Notecard, Request};

/// Re-enable the ATTN interrupt for changes to `file`.
///
/// With `strict` off (the default), every rearm error is treated as
/// success: on LTSv6-era firmware `rearm` is not idempotent and can report
/// an error even though the interrupt armed. Deployments on fixed firmware
/// set `strict` to get real failure reporting.
pub fn rearm(note: &mut impl Notecard, file: &'static str, strict: bool) -> bool {
    let req = Request::new("card.attn")
        .text("mode", "rearm,files")
        .list("files", &[file]);

    let Some(rsp) = note.transact(req) else {
        return false;
    };
    match rsp.err() {
        None => true,
        Some(err) if !strict => {
            trace!("card.attn rearm error ignored (non-idempotent firmware): {err}");
            true
        }
        Some(err) => {
            error!("card.attn rearm failed: {err}");
            false
        }
    }
}
