use crate::SourceId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StopEffect(SourceId),
    StopRuntime,
}
