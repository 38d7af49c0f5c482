//! services/client/src/adapters/payment_sheet.rs
//!
//! A terminal stand-in for the mobile payment sheet. It shows the order and
//! reads back the gateway's payment id and signature, which the tester copies
//! from the gateway's test checkout. It implements the `PaymentAuthorizer` port.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use vytal_core::domain::{OrderDescriptor, PaymentAuthorization};
use vytal_core::ports::{PaymentAuthorizer, PortError, PortResult};

pub struct ConsolePaymentSheet<R, W> {
    io: Mutex<(R, W)>,
}

impl ConsolePaymentSheet<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsolePaymentSheet<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }
}

fn io_error(e: std::io::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

async fn prompt<R, W>(reader: &mut R, writer: &mut W, label: &str) -> PortResult<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(label.as_bytes()).await.map_err(io_error)?;
    writer.flush().await.map_err(io_error)?;
    let mut line = String::new();
    reader.read_line(&mut line).await.map_err(io_error)?;
    let value = line.trim().to_string();
    // An empty answer (or end of input) dismisses the sheet.
    if value.is_empty() {
        return Err(PortError::Cancelled);
    }
    Ok(value)
}

#[async_trait]
impl<R, W> PaymentAuthorizer for ConsolePaymentSheet<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn authorize(&self, order: &OrderDescriptor) -> PortResult<PaymentAuthorization> {
        let mut guard = self.io.lock().await;
        let (reader, writer) = &mut *guard;

        let summary = format!(
            "\nPay {:.2} {} for order {} (key {})\nLeave blank to cancel.\n",
            order.order.amount as f64 / 100.0,
            order.order.currency,
            order.order.id,
            order.key_id,
        );
        writer.write_all(summary.as_bytes()).await.map_err(io_error)?;

        let payment_id = prompt(reader, writer, "Payment id: ").await?;
        let signature = prompt(reader, writer, "Signature: ").await?;
        Ok(PaymentAuthorization {
            order_id: order.order.id.clone(),
            payment_id,
            signature,
        })
    }
}
