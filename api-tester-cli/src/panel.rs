//! Terminal rendering of operation panels

use api_tester_core::{
    EndpointRegistry, InvocationState, InvocationStatus, OperationDescriptor, Payload,
};

pub fn render(descriptor: &OperationDescriptor, state: &InvocationState) -> String {
    let mut out = format!(
        "[{}] {} {}\n    {}\n",
        descriptor.id, descriptor.default_method, descriptor.path_template, descriptor.label
    );

    if state.status() == InvocationStatus::Pending {
        out.push_str("    Loading...\n");
        return out;
    }

    match state.payload() {
        Payload::Empty => out.push_str("    (not invoked)\n"),
        Payload::Response { status, body } => {
            out.push_str(&format!("    HTTP {}\n", status));
            out.push_str(&indent(body));
        }
        error @ Payload::Error(_) => out.push_str(&indent(&error.to_string())),
    }
    out
}

pub fn listing(registry: &EndpointRegistry) -> String {
    registry
        .iter()
        .map(|d| format!("{:>3}  {:<6} {}\n     {}\n", d.id, d.default_method, d.path_template, d.label))
        .collect()
}

pub fn summary(states: &[InvocationState]) -> String {
    let count = |status: InvocationStatus| states.iter().filter(|s| s.status() == status).count();
    format!(
        "{} succeeded, {} failed, {} pending, {} idle",
        count(InvocationStatus::Succeeded),
        count(InvocationStatus::Failed),
        count(InvocationStatus::Pending),
        count(InvocationStatus::Idle)
    )
}

fn indent(text: &str) -> String {
    text.lines().map(|line| format!("    {}\n", line)).collect()
}
