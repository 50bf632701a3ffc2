use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use vidgen_core::{update, AppState, AppViewModel, GenerationRequest, Msg, Phase};
use vidgen_logging::{vg_info, vg_warn};

use crate::effects::EffectRunner;
use crate::render::TerminalRenderer;

const EVENT_WAIT: Duration = Duration::from_millis(250);

/// Drives one generation from submission until the core reports a finished
/// phase, rendering every change. Returns the final view.
///
/// Raising `interrupt` cancels the generation at the next loop turn.
pub fn run_generation(
    runner: &EffectRunner,
    renderer: &mut TerminalRenderer,
    request: GenerationRequest,
    interrupt: &AtomicBool,
) -> AppViewModel {
    let mut state = dispatch(AppState::new(), Msg::Submit(request), runner, renderer);

    while state.phase().is_active() {
        let msg = if interrupt.swap(false, Ordering::SeqCst) {
            Msg::CancelRequested
        } else {
            runner.next_msg(EVENT_WAIT).unwrap_or(Msg::Tick)
        };
        state = dispatch(state, msg, runner, renderer);
    }
    state.view()
}

/// Process exit status for the phase a generation ended in.
pub fn exit_status(phase: &Phase) -> u8 {
    match phase {
        Phase::Completed => 0,
        Phase::TimedOut => 2,
        Phase::Cancelled => 130,
        _ => 1,
    }
}

fn dispatch(
    state: AppState,
    msg: Msg,
    runner: &EffectRunner,
    renderer: &mut TerminalRenderer,
) -> AppState {
    let (mut state, effects) = update(state, msg);
    runner.run(effects);
    if state.consume_dirty() {
        renderer.render(&state.view());
    }
    state
}

/// Raises the returned flag on every Ctrl-C instead of terminating.
pub fn watch_interrupts() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = flag.clone();
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                vg_warn!("Ctrl-C handling unavailable: {}", err);
                return;
            }
        };
        runtime.block_on(async {
            while tokio::signal::ctrl_c().await.is_ok() {
                vg_info!("Interrupt received; cancelling generation");
                raised.store(true, Ordering::SeqCst);
            }
        });
    });
    flag
}
