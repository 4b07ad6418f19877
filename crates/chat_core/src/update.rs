use crate::{ChatState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: ChatState, msg: Msg) -> (ChatState, Vec<Effect>) {
    let mut effects = match msg {
        Msg::Started => {
            state.start_history_load();
            vec![Effect::LoadHistory { page: 1 }]
        }
        Msg::SendRequested(raw) => match state.begin_submission(&raw) {
            Some((submission_id, text)) => vec![Effect::SendMessage {
                submission_id,
                text,
            }],
            None => Vec::new(),
        },
        Msg::SubmissionAccepted {
            submission_id,
            message_id,
            created_at,
        } => {
            // Ledger entry and in-flight marker land before polling starts.
            if state.accept_submission(submission_id, message_id.clone(), created_at) {
                vec![Effect::StartPolling { message_id }]
            } else {
                Vec::new()
            }
        }
        Msg::SubmissionFailed {
            submission_id,
            failure,
        } => {
            state.fail_submission(submission_id, failure);
            Vec::new()
        }
        Msg::HistoryLoaded(history) => {
            state.finish_history_load();
            state
                .merge_history(history)
                .into_iter()
                .map(|message_id| Effect::StartPolling { message_id })
                .collect()
        }
        Msg::HistoryFailed => {
            state.finish_history_load();
            Vec::new()
        }
        Msg::PollProgress {
            message_id,
            attempt,
        } => {
            state.record_attempt(&message_id, attempt);
            Vec::new()
        }
        Msg::PollResolved {
            message_id,
            outcome,
        } => {
            state.apply_outcome(&message_id, outcome);
            Vec::new()
        }
        Msg::CancelRequested(message_id) => {
            if state.is_in_flight(&message_id) {
                vec![Effect::CancelPolling { message_id }]
            } else {
                Vec::new()
            }
        }
        Msg::InputClosed => {
            state.close_input();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    if state.input_closed() && state.is_idle() && !effects.contains(&Effect::Quit) {
        effects.push(Effect::Quit);
    }

    (state, effects)
}
