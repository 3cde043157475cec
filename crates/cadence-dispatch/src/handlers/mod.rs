pub mod bash;
pub mod generate;
pub mod log;
pub mod mailbox;
pub mod misc;
pub mod python;
pub mod score;

use std::sync::Arc;

use cadence_core::OperationKind;

use crate::mode::ProcessingMode;
use crate::registry::HandlerRegistry;

/// Builds the registry with every built-in handler wired for both
/// modes, per spec.md §4.C. `task_instructions` feeds the `get_task`
/// handler, which otherwise has no source of truth for task content —
/// the original gets this from Vivaria; a freestanding engine takes it
/// as configuration instead.
pub fn build_default_registry(task_instructions: String) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();

    registry
        .register(OperationKind::Bash, ProcessingMode::Live, Arc::new(bash::LiveBashHandler))
        .register(
            OperationKind::Bash,
            ProcessingMode::Simulated,
            Arc::new(bash::SimulatedBashHandler),
        );

    registry
        .register(
            OperationKind::Python,
            ProcessingMode::Live,
            Arc::new(python::LivePythonHandler),
        )
        .register(
            OperationKind::Python,
            ProcessingMode::Simulated,
            Arc::new(python::SimulatedPythonHandler),
        );

    registry
        .register(
            OperationKind::Generate,
            ProcessingMode::Live,
            Arc::new(generate::LiveGenerateHandler),
        )
        .register(
            OperationKind::Generate,
            ProcessingMode::Simulated,
            Arc::new(generate::SimulatedGenerateHandler),
        );

    registry
        .register(OperationKind::Log, ProcessingMode::Live, Arc::new(log::LiveLogHandler))
        .register(
            OperationKind::Log,
            ProcessingMode::Simulated,
            Arc::new(log::SimulatedLogHandler),
        );

    registry
        .register(
            OperationKind::LogWithAttributes,
            ProcessingMode::Live,
            Arc::new(log::LiveLogWithAttributesHandler),
        )
        .register(
            OperationKind::LogWithAttributes,
            ProcessingMode::Simulated,
            Arc::new(log::SimulatedLogWithAttributesHandler),
        );

    registry.register_both(OperationKind::Score, Arc::new(score::SimulatedScoreHandler));
    registry.register_both(OperationKind::ScoreLog, Arc::new(score::SimulatedScoreLogHandler));

    registry.register_both(OperationKind::InitWorkflow, Arc::new(misc::InitWorkflowHandler));
    registry.register_both(OperationKind::SaveState, Arc::new(misc::SaveStateHandler));
    registry.register_both(OperationKind::GetUsage, Arc::new(misc::GetUsageHandler));
    registry.register_both(
        OperationKind::GetTask,
        Arc::new(misc::GetTaskHandler {
            instructions: task_instructions,
        }),
    );
    registry.register_both(OperationKind::Submit, Arc::new(misc::SubmitHandler));
    registry.register_both(OperationKind::Action, Arc::new(misc::ActionHandler));
    registry.register_both(OperationKind::Observation, Arc::new(misc::ObservationHandler));

    registry.register_both(OperationKind::WriteMessage, Arc::new(mailbox::WriteMessageHandler));
    registry.register_both(OperationKind::ReadMessages, Arc::new(mailbox::ReadMessagesHandler));

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_covers_every_operation_kind_in_both_modes() {
        let registry = build_default_registry("do the task".to_string());
        for kind in [
            OperationKind::InitWorkflow,
            OperationKind::Score,
            OperationKind::ScoreLog,
            OperationKind::Bash,
            OperationKind::Python,
            OperationKind::Generate,
            OperationKind::Submit,
            OperationKind::Log,
            OperationKind::LogWithAttributes,
            OperationKind::Action,
            OperationKind::Observation,
            OperationKind::GetUsage,
            OperationKind::GetTask,
            OperationKind::SaveState,
            OperationKind::WriteMessage,
            OperationKind::ReadMessages,
        ] {
            assert!(registry.get(kind, ProcessingMode::Live).is_ok(), "{kind:?} live");
            assert!(
                registry.get(kind, ProcessingMode::Simulated).is_ok(),
                "{kind:?} simulated"
            );
        }
    }
}
