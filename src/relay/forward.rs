//! Line forwarding between the two legs of a session
//!
//! A hop reads one `\n`-terminated line from one leg, writes it unchanged to
//! the other and flushes. Both entry points own their streams and shut both
//! of them down before returning, whatever ended the forwarding.

use super::session::{CloseReason, DirectionStats};
use crate::error::RelayError;
use std::io;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufStream,
};
use tracing::{debug, trace};

/// Initial capacity of the line buffer
const LINE_CAPACITY: usize = 1024;

/// Which way a hop moves data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Inbound leg to outbound leg
    Upstream,
    /// Outbound leg to inbound leg
    Downstream,
}

/// Failure of a single hop, split by the leg that caused it
#[derive(Debug)]
enum HopError {
    Read(RelayError),
    Write(RelayError),
}

impl HopError {
    fn read(e: io::Error) -> Self {
        HopError::Read(e.into())
    }

    fn write(e: io::Error) -> Self {
        HopError::Write(e.into())
    }

    fn close_reason(&self, direction: Direction) -> CloseReason {
        match (self, direction) {
            (HopError::Read(_), Direction::Upstream) => CloseReason::InboundError,
            (HopError::Write(_), Direction::Upstream) => CloseReason::OutboundError,
            (HopError::Read(_), Direction::Downstream) => CloseReason::OutboundError,
            (HopError::Write(_), Direction::Downstream) => CloseReason::InboundError,
        }
    }

    fn into_error(self) -> RelayError {
        match self {
            HopError::Read(e) | HopError::Write(e) => e,
        }
    }
}

/// How one direction (or the alternating loop) ended
type Ending = (CloseReason, Option<RelayError>);

/// Classify a failed hop and log it
fn hop_failed(e: HopError, direction: Direction) -> Ending {
    let reason = e.close_reason(direction);
    let error = e.into_error();
    debug!(?direction, %reason, error = %error, "Hop failed");
    (reason, Some(error))
}

/// Reason for a direction ending on graceful EOF
fn eof_reason(direction: Direction) -> CloseReason {
    match direction {
        Direction::Upstream => CloseReason::InboundClosed,
        Direction::Downstream => CloseReason::OutboundClosed,
    }
}

/// Result of forwarding, once both legs are closed
#[derive(Debug)]
pub(crate) struct ForwardOutcome {
    pub reason: CloseReason,
    /// Transport fault that ended forwarding, `None` on graceful EOF
    pub error: Option<RelayError>,
    pub upstream: DirectionStats,
    pub downstream: DirectionStats,
}

/// Move one line from `reader` to `writer`
///
/// Returns the line length, or `None` on a zero-length read.
async fn hop<R, W>(reader: &mut R, writer: &mut W, line: &mut Vec<u8>) -> Result<Option<usize>, HopError>
where
    R: AsyncBufRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    line.clear();
    let n = reader.read_until(b'\n', line).await.map_err(HopError::read)?;
    if n == 0 {
        return Ok(None);
    }

    writer.write_all(line).await.map_err(HopError::write)?;
    writer.flush().await.map_err(HopError::write)?;
    Ok(Some(n))
}

/// Forward lines in one direction until EOF or error
async fn pump<R, W>(
    reader: &mut R,
    writer: &mut W,
    direction: Direction,
    stats: &mut DirectionStats,
) -> Ending
where
    R: AsyncBufRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut line = Vec::with_capacity(LINE_CAPACITY);
    loop {
        match hop(reader, writer, &mut line).await {
            Ok(Some(n)) => {
                stats.record(n);
                trace!(?direction, bytes = n, "Forwarded line");
            }
            Ok(None) => return (eof_reason(direction), None),
            Err(e) => return hop_failed(e, direction),
        }
    }
}

/// Shut a leg down, ignoring errors from an already-dead connection
async fn close_leg<W>(leg: &mut W, name: &'static str)
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if let Err(e) = leg.shutdown().await {
        debug!(leg = name, error = %e, "Error while closing leg");
    }
}

/// Alternate between the two directions, one line each per iteration
///
/// A second line from the same side waits until the other side has sent a
/// line of its own.
pub(crate) async fn alternating<A, B>(inbound: A, outbound: B) -> ForwardOutcome
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let mut inbound = BufStream::new(inbound);
    let mut outbound = BufStream::new(outbound);
    let mut line = Vec::with_capacity(LINE_CAPACITY);
    let mut upstream = DirectionStats::default();
    let mut downstream = DirectionStats::default();

    let (reason, error) = loop {
        match hop(&mut inbound, &mut outbound, &mut line).await {
            Ok(Some(n)) => {
                upstream.record(n);
                trace!(bytes = n, "Forwarded line upstream");
            }
            Ok(None) => break (eof_reason(Direction::Upstream), None),
            Err(e) => break hop_failed(e, Direction::Upstream),
        }

        match hop(&mut outbound, &mut inbound, &mut line).await {
            Ok(Some(n)) => {
                downstream.record(n);
                trace!(bytes = n, "Forwarded line downstream");
            }
            Ok(None) => break (eof_reason(Direction::Downstream), None),
            Err(e) => break hop_failed(e, Direction::Downstream),
        }
    };

    close_leg(&mut inbound, "inbound").await;
    close_leg(&mut outbound, "outbound").await;

    ForwardOutcome {
        reason,
        error,
        upstream,
        downstream,
    }
}

/// Pump both directions concurrently; the first to end stops the other
pub(crate) async fn independent<A, B>(inbound: A, outbound: B) -> ForwardOutcome
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (inbound_read, mut inbound_write) = tokio::io::split(inbound);
    let (outbound_read, mut outbound_write) = tokio::io::split(outbound);
    let mut inbound_read = BufReader::new(inbound_read);
    let mut outbound_read = BufReader::new(outbound_read);
    let mut upstream = DirectionStats::default();
    let mut downstream = DirectionStats::default();

    let (reason, error) = tokio::select! {
        ending = pump(&mut inbound_read, &mut outbound_write, Direction::Upstream, &mut upstream) => ending,
        ending = pump(&mut outbound_read, &mut inbound_write, Direction::Downstream, &mut downstream) => ending,
    };

    close_leg(&mut inbound_write, "inbound").await;
    close_leg(&mut outbound_write, "outbound").await;

    ForwardOutcome {
        reason,
        error,
        upstream,
        downstream,
    }
}
