//! Scene list synchronization.
//!
//! A refresh is one `GetSceneList` request.  Its `responseData` carries the
//! whole batch; the batch is ordered top-first and replaces the previous list
//! in a single update, never patched piece by piece.

use midi_obs_core::protocol::messages::{request_types, SceneListResponse};
use midi_obs_core::sort_scene_batch;
use serde_json::Value;
use tracing::{debug, warn};

use crate::application::correlator::{FrameSink, RequestCorrelator};

/// Extracts the ordered scene names from a `GetSceneList` response payload.
///
/// Returns `None` if the payload lacks a well-formed `scenes` array.
pub fn scene_names_from_response(data: Value) -> Option<Vec<String>> {
    match serde_json::from_value::<SceneListResponse>(data) {
        Ok(response) => Some(sort_scene_batch(response.scenes)),
        Err(e) => {
            warn!("GetSceneList response has no usable scene list: {e}");
            None
        }
    }
}

/// Requests the scene list and returns it ordered top-first.
///
/// `None` means the request failed or the payload was unusable; the caller
/// keeps whatever list it already had.
pub async fn fetch_scene_list(
    correlator: &RequestCorrelator,
    sink: &dyn FrameSink,
) -> Option<Vec<String>> {
    let Some(data) = correlator.send(request_types::GET_SCENE_LIST, sink).await else {
        debug!("GetSceneList returned no data; keeping previous scene list");
        return None;
    };
    scene_names_from_response(data)
}
