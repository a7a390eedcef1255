//! Per-connection dispatch loop: handshake, then request/response until the
//! transport is lost or the peer disconnects.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;

use access::{AccessError, AccessManager, ConnectionId};
use protocol::{read_handshake, read_request, write_failure, write_success, ProtocolError, Request};

use crate::session::Session;

/// Runs one connection end to end: handshake, request loop, and release of
/// every handle the session still holds when it ends.
///
/// Socket I/O happens on `reader`/`writer` directly; the only synchronization
/// point is whatever critical section `manager`'s methods take internally —
/// this function itself holds no lock across a network read or write.
pub(crate) fn run(stream: TcpStream, manager: Arc<AccessManager>, connection_id: ConnectionId) {
    let peer = stream.peer_addr().ok();
    let read_half = match stream.try_clone() {
        Ok(s) => s,
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(connection_id, %err, "failed to clone connection, dropping it");
            #[cfg(not(feature = "tracing"))]
            let _ = err;
            return;
        }
    };
    let mut reader = BufReader::new(read_half);
    let mut writer = BufWriter::new(stream);

    let session = match read_handshake(&mut reader) {
        Ok(mode) => {
            if write_success(&mut writer, &[]).is_err() {
                release(&manager, connection_id);
                return;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(connection_id, ?peer, ?mode, "session started");
            Session::new(connection_id, mode)
        }
        Err(ProtocolError::InvalidSharingMode(byte)) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(connection_id, ?peer, byte, "rejected invalid sharing mode");
            let code = ProtocolError::InvalidSharingMode(byte).wire_code().unwrap_or(0);
            let _ = write_failure(&mut writer, code);
            release(&manager, connection_id);
            return;
        }
        Err(_) => {
            release(&manager, connection_id);
            return;
        }
    };

    dispatch_loop(&mut reader, &mut writer, &manager, session);
}

fn dispatch_loop<R: std::io::Read, W: std::io::Write>(
    reader: &mut R,
    writer: &mut W,
    manager: &Arc<AccessManager>,
    mut session: Session,
) {
    loop {
        let request = match read_request(reader) {
            Ok(request) => request,
            Err(_) => break,
        };

        let outcome = handle_request(manager, &mut session, request);
        let sent = match outcome {
            Ok(data) => write_success(writer, &data),
            Err(code) => write_failure(writer, code),
        };
        if sent.is_err() {
            break;
        }
    }

    #[cfg(feature = "tracing")]
    let still_held = session.held_fds().count();
    release(manager, session.connection_id);
    #[cfg(feature = "tracing")]
    tracing::debug!(connection_id = session.connection_id, still_held, "session ended");
}

fn handle_request(manager: &AccessManager, session: &mut Session, request: Request) -> Result<Vec<u8>, i32> {
    match request {
        Request::Open { path, permission } => manager
            .open(std::path::Path::new(&path), session.sharing_mode, permission, session.connection_id)
            .map(|fd| {
                session.record_open(fd);
                (-fd).to_string().into_bytes()
            })
            .map_err(wire_code),
        Request::Close { fd } => manager
            .close(fd, session.connection_id)
            .map(|()| {
                session.record_close(fd);
                Vec::new()
            })
            .map_err(wire_code),
        Request::Read { fd } => manager.read(fd, session.connection_id).map_err(wire_code),
        Request::Write { fd, data } => manager
            .write(fd, session.connection_id, &data)
            .map(|written| written.to_string().into_bytes())
            .map_err(wire_code),
    }
}

fn wire_code(err: AccessError) -> i32 {
    err.wire_code()
}

fn release(manager: &AccessManager, connection_id: ConnectionId) {
    manager.release_connection(connection_id);
}
