//! Output boundary and control services of a pipeline stage.

use crate::error::EnvError;
use crate::types::Output;
use serde::Serialize;

/// Receives the data products of a stage.
pub trait OutputSink {
    /// Hands a serialized copy of `payload` to the downstream boundary.
    fn snapshot<T>(&mut self, output: &Output, payload: &T) -> Result<(), EnvError>
    where
        T: Serialize + ?Sized;
}

/// Control channel from a stage back to the surrounding pipeline.
pub trait ControlService {
    /// Notifies the pipeline that this stage has done its work and may exit.
    ///
    /// `all` asks for the whole pipeline to stop, not just this stage.
    fn ready_to_quit(&mut self, all: bool);
}
