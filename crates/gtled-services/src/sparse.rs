//! Sparse-update reassembly: collects LED indices across the chunks of a
//! SetLeds transaction.
//!
//! Chunks are counted, not tracked by index: a retransmitted chunk counts
//! again toward completion and its indices are appended again. Senders
//! must not retransmit SetLeds chunks within one transaction.

use gtled_core::wire::SparseChunk;

use crate::buffer::IndexList;

/// State of the in-flight transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseSession {
    pub command_id: u8,
    pub expected_chunks: u8,
    pub received_chunks: u8,
}

/// Result of feeding one chunk in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SparseProgress {
    /// More chunks are needed.
    Pending { received: u8, expected: u8 },
    /// Every expected chunk has arrived; these are all collected indices in
    /// arrival order. The session is closed.
    Complete(Vec<u16>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SparseError {
    #[error("transaction {command_id} declares zero chunks")]
    ZeroChunks { command_id: u8 },

    #[error(
        "transaction {command_id} aborted: {collected} + {incoming} indices exceed capacity {capacity}"
    )]
    Overflow {
        command_id: u8,
        collected: usize,
        incoming: usize,
        capacity: usize,
    },
}

/// The single sparse-update session slot plus its index storage.
#[derive(Debug)]
pub struct SparseReassembler {
    session: Option<SparseSession>,
    indices: IndexList,
}

impl SparseReassembler {
    /// `capacity` bounds the total number of indices one transaction may carry.
    pub fn new(capacity: usize) -> Self {
        Self {
            session: None,
            indices: IndexList::with_capacity(capacity),
        }
    }

    pub fn session(&self) -> Option<SparseSession> {
        self.session
    }

    /// Indices collected so far by the open session.
    pub fn collected(&self) -> &[u16] {
        self.indices.as_slice()
    }

    /// Drop any partial transaction.
    pub fn reset(&mut self) {
        self.session = None;
        self.indices.clear();
    }

    pub fn accept(&mut self, chunk: &SparseChunk<'_>) -> Result<SparseProgress, SparseError> {
        let header = chunk.header;
        let command_id = header.command_id;

        let mut session = match self.session.filter(|s| s.command_id == command_id) {
            Some(session) => session,
            None => self.start(command_id, header.total_chunks)?,
        };

        let collected = self.indices.len();
        if let Err(e) = self.indices.try_extend(chunk.indices()) {
            self.reset();
            return Err(SparseError::Overflow {
                command_id,
                collected,
                incoming: e.len,
                capacity: e.capacity,
            });
        }
        session.received_chunks += 1;

        tracing::debug!(
            command_id,
            chunk = header.chunk_index,
            received = session.received_chunks,
            expected = session.expected_chunks,
            ids_in_chunk = chunk.index_count(),
            ids_total = self.indices.len(),
            "sparse chunk accepted"
        );

        if session.received_chunks == session.expected_chunks {
            let ids = self.indices.as_slice().to_vec();
            self.reset();
            return Ok(SparseProgress::Complete(ids));
        }
        self.session = Some(session);
        Ok(SparseProgress::Pending {
            received: session.received_chunks,
            expected: session.expected_chunks,
        })
    }

    /// Open a new transaction, discarding whatever was in flight.
    fn start(&mut self, command_id: u8, total_chunks: u8) -> Result<SparseSession, SparseError> {
        if total_chunks == 0 {
            return Err(SparseError::ZeroChunks { command_id });
        }
        if let Some(old) = self.session {
            tracing::debug!(
                old_id = old.command_id,
                received = old.received_chunks,
                expected = old.expected_chunks,
                "discarding partial sparse update"
            );
        }
        self.indices.clear();
        let session = SparseSession {
            command_id,
            expected_chunks: total_chunks,
            received_chunks: 0,
        };
        self.session = Some(session);
        tracing::info!(command_id, total_chunks, "sparse update started");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtled_core::wire::{encode_set_leds, validate, SparseChunk};

    fn chunk_bytes(command_id: u8, total: u8, index: u8, ids: &[u16]) -> Vec<u8> {
        let mut bytes = vec![command_id, total, index];
        for id in ids {
            bytes.extend_from_slice(&id.to_le_bytes());
        }
        bytes
    }

    fn feed(
        r: &mut SparseReassembler,
        command_id: u8,
        total: u8,
        index: u8,
        ids: &[u16],
    ) -> Result<SparseProgress, SparseError> {
        let bytes = chunk_bytes(command_id, total, index, ids);
        r.accept(&SparseChunk::parse(&bytes).unwrap())
    }

    #[test]
    fn two_chunks_complete_with_union_of_indices() {
        let mut r = SparseReassembler::new(300);
        assert_eq!(
            feed(&mut r, 5, 2, 0, &[1, 2]).unwrap(),
            SparseProgress::Pending {
                received: 1,
                expected: 2
            }
        );
        assert_eq!(
            feed(&mut r, 5, 2, 1, &[3]).unwrap(),
            SparseProgress::Complete(vec![1, 2, 3])
        );
        assert!(r.session().is_none());
    }

    #[test]
    fn out_of_order_arrival_yields_same_set() {
        let mut r = SparseReassembler::new(300);
        feed(&mut r, 5, 2, 1, &[3]).unwrap();
        let SparseProgress::Complete(mut ids) = feed(&mut r, 5, 2, 0, &[1, 2]).unwrap() else {
            panic!("expected completion");
        };
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn retransmitted_chunk_double_counts() {
        // Chunks are counted, not deduplicated: resending chunk 0 completes the
        // transaction before chunk 1 ever arrives.
        let mut r = SparseReassembler::new(300);
        feed(&mut r, 8, 2, 0, &[1, 2]).unwrap();
        assert_eq!(
            feed(&mut r, 8, 2, 0, &[1, 2]).unwrap(),
            SparseProgress::Complete(vec![1, 2, 1, 2])
        );
    }

    #[test]
    fn new_command_id_discards_partial_session() {
        let mut r = SparseReassembler::new(300);
        feed(&mut r, 1, 3, 0, &[10, 11]).unwrap();
        assert_eq!(r.collected(), &[10, 11]);
        assert_eq!(
            feed(&mut r, 2, 1, 0, &[20]).unwrap(),
            SparseProgress::Complete(vec![20])
        );
    }

    #[test]
    fn overflow_aborts_session_without_partial_result() {
        let mut r = SparseReassembler::new(3);
        feed(&mut r, 4, 2, 0, &[1, 2]).unwrap();
        let err = feed(&mut r, 4, 2, 1, &[3, 4]).unwrap_err();
        assert_eq!(
            err,
            SparseError::Overflow {
                command_id: 4,
                collected: 2,
                incoming: 2,
                capacity: 3
            }
        );
        assert!(r.session().is_none());
        assert!(r.collected().is_empty());

        // The same id now opens a fresh transaction.
        assert_eq!(
            feed(&mut r, 4, 2, 1, &[3]).unwrap(),
            SparseProgress::Pending {
                received: 1,
                expected: 2
            }
        );
    }

    #[test]
    fn zero_chunk_transaction_is_rejected_without_touching_state() {
        let mut r = SparseReassembler::new(300);
        feed(&mut r, 1, 2, 0, &[7]).unwrap();
        assert_eq!(
            feed(&mut r, 9, 0, 0, &[]).unwrap_err(),
            SparseError::ZeroChunks { command_id: 9 }
        );
        let session = r.session().unwrap();
        assert_eq!(session.command_id, 1);
        assert_eq!(r.collected(), &[7]);
    }

    #[test]
    fn id_0xff_is_a_normal_id() {
        let mut r = SparseReassembler::new(300);
        assert_eq!(
            feed(&mut r, 0xff, 1, 0, &[9]).unwrap(),
            SparseProgress::Complete(vec![9])
        );
    }

    #[test]
    fn encoder_output_reassembles() {
        let ids: Vec<u16> = (0..150).collect();
        let mut r = SparseReassembler::new(300);
        let mut result = None;
        for datagram in encode_set_leds(3, &ids, 60).unwrap() {
            let packet = validate(&datagram).unwrap();
            result = Some(r.accept(&SparseChunk::parse(packet.payload).unwrap()).unwrap());
        }
        assert_eq!(result, Some(SparseProgress::Complete(ids)));
    }
}
