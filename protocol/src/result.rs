//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Error types and result aliases for protocol operations

/// Result type for protocol operations
///
/// # Examples
///
/// ```
/// use parrot_protocol::ProtocolResult;
///
/// fn example() -> ProtocolResult<()> {
///     Ok(())
/// }
/// ```
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol traffic
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// An I/O error occurred on the underlying stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A payload exceeded the protocol's buffer bound
    #[error("Payload of {size} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Size of the rejected payload
        size: usize,
        /// Largest accepted payload
        max: usize,
    },
}
