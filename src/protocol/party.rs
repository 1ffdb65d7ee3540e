//! provides party utilities

use super::error::{Error, ProtocolErrorKind, Result, TransportErrorKind};
use serde::{de::DeserializeOwned, Serialize};
use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

/// frames larger than this are rejected on both sides
const MAX_FRAME: usize = 1 << 24;

const CONNECT_RETRIES: usize = 100;
const CONNECT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// one endpoint of a reliable, ordered, bidirectional two-party channel
pub struct TwoParty {
    /// endpoint id (0 or 1; endpoint 0 listens on the rendezvous address)
    pub id: usize,
    /// used to send and receive messages between the endpoints
    session: RefCell<Session>,
}

impl TwoParty {
    /// create a new endpoint and block until the peer is connected
    pub fn new(id: usize, rendezvous: SocketAddr) -> Result<Self> {
        assert!(id < 2, "a two-party channel has endpoints 0 and 1");
        Ok(Self {
            id,
            session: RefCell::new(Session::new(id, rendezvous)?),
        })
    }

    /// send a frame to the other endpoint
    pub fn push(&self, msg: &[u8]) -> Result<()> {
        self.session.borrow_mut().send(msg)
    }

    /// receive a frame from the other endpoint
    pub fn pull(&self) -> Result<Vec<u8>> {
        self.session.borrow_mut().recv()
    }

    /// serialize and send a value to the other endpoint
    pub fn push_value<T: Serialize>(&self, value: &T) -> Result<()> {
        self.push(&serde_json::to_vec(value)?)
    }

    /// receive and deserialize a value from the other endpoint
    pub fn pull_value<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.pull()?)?)
    }
}

/// A session is the socket between the current endpoint and its peer.
/// Messages are framed as a 4-byte little-endian length header followed
/// by the payload, since the stream itself carries no boundaries.
struct Session {
    socket: TcpStream,
}

impl Session {
    /// establish the socket: endpoint 0 listens on the rendezvous
    /// address, endpoint 1 dials it
    fn new(id: usize, rendezvous: SocketAddr) -> Result<Self> {
        let mut socket = if id == 0 {
            let listener = TcpListener::bind(rendezvous)?;
            let (socket, _) = listener.accept()?;
            socket
        } else {
            connect(rendezvous)?
        };
        // authentication, now simply by exchanging whom each endpoint claims to be
        socket.write_all(&(id as u64).to_le_bytes())?;
        let mut buf = [0u8; 8];
        socket.read_exact(&mut buf)?;
        if u64::from_le_bytes(buf) as usize != 1 - id {
            return Err(Error::Protocol(ProtocolErrorKind::UnexpectedMessage));
        }
        Ok(Self { socket })
    }

    /// send `data` to the peer, blocking until the transmission is accepted
    fn send(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FRAME {
            return Err(Error::Transport(TransportErrorKind::FrameTooLarge));
        }
        self.socket.write_all(&(data.len() as u32).to_le_bytes())?;
        self.socket.write_all(data)?;
        Ok(())
    }

    /// receive one frame from the peer
    fn recv(&mut self) -> Result<Vec<u8>> {
        let mut header = [0u8; 4];
        self.socket.read_exact(&mut header)?;
        let len = u32::from_le_bytes(header) as usize;
        if len > MAX_FRAME {
            return Err(Error::Transport(TransportErrorKind::Malformed));
        }
        let mut buf = vec![0; len];
        self.socket.read_exact(&mut buf)?;
        Ok(buf)
    }
}

/// dial the rendezvous address, retrying while the listener comes up
// todo: make the retry budget part of Config
fn connect(rendezvous: SocketAddr) -> Result<TcpStream> {
    let mut attempts = 0;
    loop {
        match TcpStream::connect(rendezvous) {
            Ok(stream) => return Ok(stream),
            Err(_) if attempts < CONNECT_RETRIES => {
                attempts += 1;
                thread::sleep(CONNECT_RETRY_DELAY);
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[test]
fn test_framing_roundtrip() {
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
    struct Probe {
        tag: String,
        values: Vec<u64>,
        flag: bool,
    }

    let rendezvous = SocketAddr::from(([127, 0, 0, 1], 7946));
    let probe = Probe {
        tag: "cross term".into(),
        values: vec![0, 1, u64::MAX],
        flag: true,
    };
    let mut echoed = None;
    thread::scope(|scope| {
        scope.spawn(|| {
            let party = TwoParty::new(0, rendezvous).unwrap();
            party.push_value(&probe).unwrap();
            echoed = Some(party.pull_value::<Probe>().unwrap());
            assert_eq!(
                Error::Transport(TransportErrorKind::FrameTooLarge),
                party.push(&vec![0u8; MAX_FRAME + 1]).unwrap_err()
            );
        });
        scope.spawn(|| {
            let party = TwoParty::new(1, rendezvous).unwrap();
            let received = party.pull_value::<Probe>().unwrap();
            party.push_value(&received).unwrap();
        });
    });
    assert_eq!(Some(probe), echoed);
}

#[test]
fn test_fifo_order() {
    let rendezvous = SocketAddr::from(([127, 0, 0, 1], 7948));
    let mut received = vec![];
    thread::scope(|scope| {
        scope.spawn(|| {
            let party = TwoParty::new(0, rendezvous).unwrap();
            for value in 0u64..16 {
                party.push_value(&value).unwrap();
            }
        });
        scope.spawn(|| {
            let party = TwoParty::new(1, rendezvous).unwrap();
            for _ in 0..16 {
                received.push(party.pull_value::<u64>().unwrap());
            }
        });
    });
    assert_eq!((0u64..16).collect::<Vec<_>>(), received);
}
