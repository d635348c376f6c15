use state_machines::state_machine;

state_machine! {
    name: ExpansionMachine,
    state: ExpansionState,
    initial: Ready,
    states: [Ready, Chunked, Annotated, Expanded, Failed],
    events {
        chunk { transition: { from: Ready, to: Chunked } }
        annotate { transition: { from: Chunked, to: Annotated } }
        expand { transition: { from: Annotated, to: Expanded } }
        abort {
            transition: { from: Ready, to: Failed }
            transition: { from: Chunked, to: Failed }
            transition: { from: Annotated, to: Failed }
            transition: { from: Expanded, to: Failed }
        }
    }
}

pub fn ready() -> ExpansionMachine<(), Ready> {
    ExpansionMachine::new(())
}
