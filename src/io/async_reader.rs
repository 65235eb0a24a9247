//! Asynchronous CSV reader with stream interface
//!
//! Provides a streaming interface over batch instructions from a CSV file.
//! Supports batch reading for efficient async processing.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - tokio for async runtime and concurrency primitives
//! - Batch reading for efficient processing
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Instructions
//!                  ↓
//!           csv_format module
//!           (CsvInstruction, convert_csv_instruction)
//! ```

use crate::io::csv_format::{convert_csv_instruction, CsvInstruction};
use crate::types::Instruction;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV reader
///
/// Provides batch reading interface over batch instructions.
/// Maintains streaming behavior with constant memory usage.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing CSV data
    ///
    /// # Returns
    ///
    /// A new AsyncReader instance
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read a batch of instructions
    ///
    /// This method reads up to `batch_size` rows from the CSV file,
    /// converting them to Instructions. Invalid rows are logged and
    /// skipped.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Maximum number of instructions to read
    ///
    /// # Returns
    ///
    /// A vector of successfully converted instructions.
    /// Returns an empty vector when the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Instruction> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvInstruction>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_instruction)) => match convert_csv_instruction(csv_instruction) {
                    Ok(instruction) => batch.push(instruction),
                    Err(e) => tracing::warn!("Skipping instruction: {}", e),
                },
                Some(Err(e)) => tracing::warn!("CSV parse error: {}", e),
                None => break,
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
            open,RIB_1,,1000000,user1,\n\
            open,RIB_2,,2000000,user2,\n\
            transfer,RIB_1,RIB_2,10000,user1,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert!(matches!(&batch[0], Instruction::Open { rib, .. } if rib == "RIB_1"));
        assert!(matches!(&batch[1], Instruction::Open { rib, .. } if rib == "RIB_2"));

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        match &batch[0] {
            Instruction::Transfer(request) => {
                assert_eq!(request.rib_from, "RIB_1");
                assert_eq!(request.rib_to, "RIB_2");
                assert_eq!(request.amount, Decimal::new(10_000, 0));
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 0);
    }

    #[tokio::test]
    async fn test_async_reader_invalid_row() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
            teleport,RIB_1,,100.0,user1,\n\
            open,RIB_2,,50.0,user2,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        // First row should fail conversion (unknown op)
        // Second row should succeed
        let batch = async_reader.read_batch(10).await;
        // Only the valid row should be in the batch (invalid one is logged)
        assert_eq!(batch.len(), 1);
        assert!(matches!(&batch[0], Instruction::Open { rib, .. } if rib == "RIB_2"));
    }

    #[tokio::test]
    async fn test_async_reader_correlation_ids() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
            transfer,RIB_1,RIB_2,100.0,user1,batch-42\n\
            transfer,RIB_1,RIB_2,50.0,user1,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 2);
        assert!(matches!(
            &batch[0],
            Instruction::Transfer(request) if request.cid.as_deref() == Some("batch-42")
        ));
        assert!(matches!(
            &batch[1],
            Instruction::Transfer(request) if request.cid.is_none()
        ));
    }

    #[tokio::test]
    async fn test_async_reader_batch_size_larger_than_rows() {
        let csv_content = "type,rib,rib_to,amount,user,cid\nopen,RIB_1,,100.0,user1,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(100).await;
        assert_eq!(batch.len(), 1);
    }

    #[tokio::test]
    async fn test_async_reader_multiple_batches() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
            open,RIB_1,,100.0,user1,\n\
            open,RIB_2,,200.0,user2,\n\
            open,RIB_3,,300.0,user3,\n\
            open,RIB_4,,400.0,user4,\n\
            open,RIB_5,,500.0,user5,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch1 = async_reader.read_batch(2).await;
        assert_eq!(batch1.len(), 2);
        assert!(matches!(&batch1[0], Instruction::Open { rib, .. } if rib == "RIB_1"));
        assert!(matches!(&batch1[1], Instruction::Open { rib, .. } if rib == "RIB_2"));

        let batch2 = async_reader.read_batch(2).await;
        assert_eq!(batch2.len(), 2);
        assert!(matches!(&batch2[0], Instruction::Open { rib, .. } if rib == "RIB_3"));
        assert!(matches!(&batch2[1], Instruction::Open { rib, .. } if rib == "RIB_4"));

        let batch3 = async_reader.read_batch(2).await;
        assert_eq!(batch3.len(), 1);
        assert!(matches!(&batch3[0], Instruction::Open { rib, .. } if rib == "RIB_5"));

        let batch4 = async_reader.read_batch(2).await;
        assert_eq!(batch4.len(), 0);
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let csv_content =
            "type,rib,rib_to,amount,user,cid\n  transfer  ,  RIB_1  ,  RIB_2  ,  100.0  ,  user1  ,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        match &batch[0] {
            Instruction::Transfer(request) => {
                assert_eq!(request.rib_from, "RIB_1");
                assert_eq!(request.username, "user1");
            }
            other => panic!("unexpected instruction {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_async_reader_case_insensitive_op() {
        let csv_content = "type,rib,rib_to,amount,user,cid\n\
            OPEN,RIB_1,,100.0,user1,\n\
            Block,RIB_1,,,,\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch[0], Instruction::Open { .. }));
        assert!(matches!(batch[1], Instruction::Block { .. }));
    }

    #[tokio::test]
    async fn test_async_reader_short_lifecycle_rows() {
        let csv_content = "type,rib,rib_to,amount,user,cid\nclose,RIB_1\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert!(matches!(&batch[0], Instruction::Close { rib } if rib == "RIB_1"));
    }
}
