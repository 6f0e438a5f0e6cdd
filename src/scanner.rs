//! Barcode scanner collaborators
//!
//! A scanner only has to hand over decoded strings and say whether it has a
//! torch. Scanner failures are reported to the caller and never reach the
//! catalog.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::error::ScannerError;

/// Which camera a scanner should use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear camera
    #[default]
    Environment,
    /// Front camera
    User,
}

#[async_trait]
pub trait BarcodeScanner: Send {
    async fn start(&mut self, facing: FacingMode) -> Result<(), ScannerError>;

    /// Next decoded code, or `None` once the scanner is stopped or exhausted
    async fn next_code(&mut self) -> Option<String>;

    async fn stop(&mut self);

    fn torch_supported(&self) -> bool;

    async fn set_torch(&mut self, on: bool) -> Result<(), ScannerError>;
}

/// Desired torch state, only committed once the scanner accepts it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Torch {
    on: bool,
}

impl Torch {
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flip the torch; the state is kept as it was if the scanner refuses
    pub async fn toggle<S>(&mut self, scanner: &mut S) -> Result<bool, ScannerError>
    where
        S: BarcodeScanner + ?Sized,
    {
        if !scanner.torch_supported() {
            return Err(ScannerError::TorchUnsupported);
        }
        let wanted = !self.on;
        if let Err(e) = scanner.set_torch(wanted).await {
            log::warn!("Torch toggle failed: {}", e);
            return Err(e);
        }
        self.on = wanted;
        Ok(wanted)
    }

    /// Switch the torch off before the scanner stops
    pub async fn release<S>(&mut self, scanner: &mut S)
    where
        S: BarcodeScanner + ?Sized,
    {
        if self.on {
            if let Err(e) = scanner.set_torch(false).await {
                log::debug!("Could not switch torch off: {}", e);
            }
            self.on = false;
        }
    }
}

/// Scanner reading one code per line, as keyboard-wedge scanners type them
pub struct LineScanner<R> {
    lines: Lines<R>,
    running: bool,
}

impl<R: AsyncBufRead + Unpin + Send> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            running: false,
        }
    }
}

impl LineScanner<tokio::io::BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> BarcodeScanner for LineScanner<R> {
    async fn start(&mut self, facing: FacingMode) -> Result<(), ScannerError> {
        log::debug!("Line scanner started ({:?} ignored)", facing);
        self.running = true;
        Ok(())
    }

    async fn next_code(&mut self) -> Option<String> {
        if !self.running {
            return None;
        }
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Failed to read from scanner input: {}", e);
                None
            }
        }
    }

    async fn stop(&mut self) {
        self.running = false;
    }

    fn torch_supported(&self) -> bool {
        false
    }

    async fn set_torch(&mut self, _on: bool) -> Result<(), ScannerError> {
        Err(ScannerError::TorchUnsupported)
    }
}
