use chat_core::{update, ChatState, Msg};

#[test]
fn update_is_noop() {
    let state = ChatState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
