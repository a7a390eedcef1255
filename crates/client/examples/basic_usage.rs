//! Connects to a running `netfiled`, opens a file read/write, writes a
//! greeting, reads it back, and closes the handle.

use std::env;

use client::{NetFileClient, Permission, SharingMode};

fn main() {
    let host = env::args().nth(1).unwrap_or_else(|| "localhost:20000".to_string());
    let path = env::args().nth(2).unwrap_or_else(|| "greeting.txt".to_string());

    let mut client = NetFileClient::connect(&host, SharingMode::Unrestricted)
        .unwrap_or_else(|err| panic!("failed to connect to {host}: {err}"));

    let fd = client
        .open(&path, Permission::ReadWrite)
        .unwrap_or_else(|err| panic!("failed to open {path}: {err}"));

    let written = client
        .write(fd, b"Hello, remote file service!")
        .expect("write failed");
    println!("wrote {written} bytes");

    let mut buf = [0u8; 256];
    let read = client.read(fd, &mut buf).expect("read failed");
    println!("read back: {}", String::from_utf8_lossy(&buf[..read]));

    client.close(fd).expect("close failed");
}
