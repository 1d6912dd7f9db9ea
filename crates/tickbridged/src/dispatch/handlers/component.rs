use crate::dispatch::body;
use crate::dispatch::context::HandlerContext;
use crate::dispatch::errors::BridgeError;
use crate::dispatch::router::RouteRequest;
use crate::host::Operation;
use crate::wire::ResultEnvelope;

use super::{apply_to_targets, modify_targets};

pub(super) fn add(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let targets = body::targets(&body)?;
    let operation = Operation::AddMember {
        type_name: body::required_string(&body, "component")?,
    };
    apply_to_targets(context, &targets, &operation, "add_component")
}

pub(super) fn remove(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let targets = body::targets(&body)?;
    let operation = Operation::RemoveMember {
        type_name: body::required_string(&body, "component")?,
    };
    apply_to_targets(context, &targets, &operation, "remove_component")
}

pub(super) fn modify(
    context: &mut HandlerContext<'_>,
    request: &RouteRequest<'_>,
) -> Result<ResultEnvelope, BridgeError> {
    let body = request.json()?;
    let targets = body::targets(&body)?;
    let component = body::required_string(&body, "component")?;
    let properties = body::properties(&body)?;
    modify_targets(
        context,
        &targets,
        Some(&component),
        &properties,
        "modify_component",
    )
}
