use std::io::{self, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::Context;
use chat_core::{update, ChatState, Msg};
use chat_engine::{EngineConfig, EngineHandle};
use chat_logging::chat_info;

use super::effects::{EffectRunner, Flow};
use super::input;
use super::render::Renderer;

/// How long the loop waits for user input before checking the engine again.
const TICK: Duration = Duration::from_millis(50);

pub fn run_app(config: EngineConfig) -> anyhow::Result<()> {
    chat_info!(
        "starting chat client base_url={} poll={:?}",
        config.base_url,
        config.poll
    );
    let engine = EngineHandle::new(config).context("creating HTTP client")?;
    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    input::spawn_reader(msg_tx.clone());

    let mut app = App {
        state: ChatState::new(),
        renderer: Renderer::default(),
        runner: EffectRunner::new(engine),
    };

    let mut flow = app.dispatch(Msg::Started)?;
    while flow == Flow::Continue {
        while let Some(msg) = app.runner.next_msg() {
            flow = app.dispatch(msg)?;
            if flow == Flow::Quit {
                break;
            }
        }
        if flow == Flow::Quit {
            break;
        }
        flow = match msg_rx.recv_timeout(TICK) {
            Ok(msg) => app.dispatch(msg)?,
            Err(RecvTimeoutError::Timeout) => Flow::Continue,
            // Unreachable while `msg_tx` is alive.
            Err(RecvTimeoutError::Disconnected) => Flow::Quit,
        };
    }

    app.runner.shutdown();
    chat_info!("chat client finished");
    Ok(())
}

struct App {
    state: ChatState,
    renderer: Renderer,
    runner: EffectRunner,
}

impl App {
    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<Flow> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            let mut out = io::stdout().lock();
            for line in self.renderer.render(&view) {
                writeln!(out, "{line}").context("writing to stdout")?;
            }
            out.flush().context("flushing stdout")?;
        }
        self.state = state;
        Ok(self.runner.run(effects))
    }
}
