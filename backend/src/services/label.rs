//! Roll label rendering and printing
//!
//! Labels are ESC/POS documents: the roll attributes as text and a native
//! QR code carrying the roll ID. Jobs go to a raw TCP label printer.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use shared::{Roll, RollId, Session};

use crate::config::PrinterConfig;
use crate::error::{AppError, AppResult};
use crate::repository::RollRepository;
use crate::services::require_confirmation;

/// ESC/POS command builder for roll labels
pub struct LabelBuilder {
    buf: Vec<u8>,
}

impl LabelBuilder {
    pub fn new() -> Self {
        let mut buf = Vec::with_capacity(512);
        // ESC @
        buf.extend_from_slice(&[0x1B, 0x40]);
        Self { buf }
    }

    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// ESC d n
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        self
    }

    pub fn center(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x01]);
        self
    }

    pub fn left(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, 0x00]);
        self
    }

    pub fn bold(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x01]);
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, 0x00]);
        self
    }

    pub fn double_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x11]);
        self
    }

    pub fn reset_size(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x21, 0x00]);
        self
    }

    /// Native QR code, model 2, error correction L. Size is the module size in dots (1-16).
    pub fn qr_code(&mut self, data: &str, size: u8) -> &mut Self {
        let size = size.clamp(1, 16);

        // Select model 2
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]);
        // Module size
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, size]);
        // Error correction L
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x30]);

        // Store data
        let data = data.as_bytes();
        let len = data.len() + 3;
        let p_l = (len & 0xFF) as u8;
        let p_h = ((len >> 8) & 0xFF) as u8;
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, p_l, p_h, 0x31, 0x50, 0x30]);
        self.buf.extend_from_slice(data);

        // Print symbol
        self.buf
            .extend_from_slice(&[0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);
        self
    }

    /// GS V B n: feed then partial cut
    pub fn cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x42, 0x03]);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for LabelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the label for one roll
pub fn render_label(roll: &Roll, qr_module_size: u8) -> Vec<u8> {
    let mut label = LabelBuilder::new();
    label
        .left()
        .bold()
        .double_size()
        .line(&format!("ID: {}", roll.id))
        .reset_size()
        .bold_off()
        .line(&format!("Ngày nhập: {}", roll.received_date.format("%d/%m/%Y")))
        .line(&format!("Style: {}", roll.style))
        .line(&format!("MO: {}", roll.mo))
        .line(&format!("Loại vải: {}", roll.fabric_type))
        .line(&format!("ĐVT: {}", roll.unit))
        .line(&format!("Lot: {}", roll.lot))
        .line(&format!("Màu: {}", roll.color))
        .line(&format!("Cuộn số: {}", roll.roll_number))
        .line(&format!("Số yard: {}", roll.yards))
        .center()
        .qr_code(roll.id.as_str(), qr_module_size)
        .feed(2)
        .cut();
    label.build()
}

/// Sink for rendered label jobs
#[async_trait]
pub trait LabelPrinter: Send + Sync {
    async fn print(&self, data: &[u8]) -> AppResult<()>;
}

/// Raw TCP label printer (port 9100)
#[derive(Debug, Clone)]
pub struct NetworkPrinter {
    host: String,
    port: u16,
    timeout: Duration,
}

impl NetworkPrinter {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn from_config(config: &PrinterConfig) -> Self {
        Self::new(config.host.clone(), config.port).with_timeout(config.timeout())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LabelPrinter for NetworkPrinter {
    async fn print(&self, data: &[u8]) -> AppResult<()> {
        let addr = format!("{}:{}", self.host, self.port);
        tracing::info!(%addr, bytes = data.len(), "Sending label job");

        let mut stream = tokio::time::timeout(
            self.timeout,
            TcpStream::connect((self.host.as_str(), self.port)),
        )
        .await
        .map_err(|_| AppError::Printer(format!("connection timeout: {}", addr)))?
        .map_err(|e| AppError::Printer(format!("{}: {}", addr, e)))?;

        stream
            .write_all(data)
            .await
            .map_err(|e| AppError::Printer(format!("write failed: {}", e)))?;
        stream
            .flush()
            .await
            .map_err(|e| AppError::Printer(format!("flush failed: {}", e)))?;

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PrintReport {
    pub printed: usize,
    /// Selected IDs that no longer exist in this warehouse
    pub missing: Vec<RollId>,
}

#[derive(Clone)]
pub struct LabelService {
    rolls: Arc<dyn RollRepository>,
    printer: Arc<dyn LabelPrinter>,
    qr_module_size: u8,
}

impl LabelService {
    pub fn new(
        rolls: Arc<dyn RollRepository>,
        printer: Arc<dyn LabelPrinter>,
        qr_module_size: u8,
    ) -> Self {
        Self {
            rolls,
            printer,
            qr_module_size,
        }
    }

    /// Print one label per selected roll as a single job
    pub async fn print(
        &self,
        session: &Session,
        ids: &BTreeSet<RollId>,
        confirm: bool,
    ) -> AppResult<PrintReport> {
        if ids.is_empty() {
            return Err(AppError::ValidationError("No rolls selected".to_string()));
        }
        require_confirmation("print labels for", ids.len(), confirm)?;

        let mut job = Vec::new();
        let mut printed = 0;
        let mut missing = Vec::new();
        for id in ids {
            match self.rolls.find_by_id(&session.warehouse_scope, id).await? {
                Some(roll) => {
                    job.extend(render_label(&roll, self.qr_module_size));
                    printed += 1;
                }
                None => missing.push(id.clone()),
            }
        }

        if printed == 0 {
            return Err(AppError::NotFound("selected rolls".to_string()));
        }

        self.printer.print(&job).await?;
        tracing::info!(printed, missing = missing.len(), "Labels printed");

        Ok(PrintReport { printed, missing })
    }
}
