use std::io::{Cursor, Read, Write};

use ed25519_dalek::{Signer, SigningKey};
use sigil_archive::Container;
use sigil_signature::{Ed25519Verifier, Error, VerifyLimits, verify_entry};
use zip::write::SimpleFileOptions;

const BLOCK_MAP: &str = "BlockMap.json";
const SIGNATURE: &str = "Signature.sig";

fn signing_key() -> SigningKey { SigningKey::from_bytes(&[7u8; 32]) }

fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        writer.start_file(*name, options).expect("start file");
        writer.write_all(data).expect("write file");
    }
    writer.finish().expect("finish zip").into_inner()
}

fn signed_package(descriptor: &[u8], signed_over: &[u8]) -> Container<Vec<u8>> {
    let signature = signing_key().sign(signed_over).to_bytes();
    let bytes = build_zip(&[(BLOCK_MAP, descriptor), (SIGNATURE, signature.as_slice())]);
    Container::open(bytes).expect("open container")
}

#[test]
fn embedded_signature_verifies_block_map() {
    let descriptor = br#"{"hashMethod":"sha256","files":[]}"#;
    let container = signed_package(descriptor, descriptor);
    let verifier = Ed25519Verifier::new(signing_key().verifying_key());

    let mut stream = verify_entry(&container, SIGNATURE, BLOCK_MAP, &verifier, &VerifyLimits::default())
        .expect("signature verifies");
    let mut replay = Vec::new();
    stream.read_to_end(&mut replay).unwrap();
    assert_eq!(replay, descriptor);
    assert!(stream.is_verified());
}

#[test]
fn descriptor_changed_after_signing_is_rejected() {
    let container = signed_package(br#"{"hashMethod":"sha512","files":[]}"#, br#"{"hashMethod":"sha256","files":[]}"#);
    let verifier = Ed25519Verifier::new(signing_key().verifying_key());

    let result = verify_entry(&container, SIGNATURE, BLOCK_MAP, &verifier, &VerifyLimits::default());
    assert!(matches!(result, Err(Error::SignatureInvalid(_))));
}

#[test]
fn untrusted_signer_is_rejected() {
    let descriptor = br#"{"hashMethod":"sha256","files":[]}"#;
    let container = signed_package(descriptor, descriptor);
    let verifier = Ed25519Verifier::new(SigningKey::from_bytes(&[9u8; 32]).verifying_key());

    let result = verify_entry(&container, SIGNATURE, BLOCK_MAP, &verifier, &VerifyLimits::default());
    assert!(matches!(result, Err(Error::SignatureInvalid(_))));
}

#[test]
fn missing_signature_entry_is_file_not_found() {
    let container = Container::open(build_zip(&[(BLOCK_MAP, b"{}".as_slice())])).unwrap();
    let verifier = Ed25519Verifier::new(signing_key().verifying_key());

    let result = verify_entry(&container, SIGNATURE, BLOCK_MAP, &verifier, &VerifyLimits::default());
    assert!(matches!(
        result,
        Err(Error::Archive(sigil_archive::Error::FileNotFound { path })) if path == SIGNATURE
    ));
}

#[test]
fn oversized_signed_entry_is_rejected() {
    let descriptor = br#"{"hashMethod":"sha256","files":[]}"#;
    let container = signed_package(descriptor, descriptor);
    let verifier = Ed25519Verifier::new(signing_key().verifying_key());

    let limits = VerifyLimits::default().max_signed_bytes(8);
    let result = verify_entry(&container, SIGNATURE, BLOCK_MAP, &verifier, &limits);
    assert!(matches!(result, Err(Error::SignatureInvalid(_))));
}

#[test]
fn corrupted_deflated_block_map_is_signature_invalid() {
    let descriptor = br#"{"hashMethod":"sha256","files":[{"name":"a.txt","size":5,"blocks":[{"hash":"LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=","size":5}]}]}"#;
    let bytes = build_zip(&[
        (BLOCK_MAP, descriptor.as_slice()),
        (SIGNATURE, signing_key().sign(descriptor).to_bytes().as_slice()),
    ]);
    let entry = Container::open(bytes.clone()).unwrap().entry(BLOCK_MAP).unwrap().clone();
    assert!(entry.is_compressed());
    let verifier = Ed25519Verifier::new(signing_key().verifying_key());

    let mut rejected = 0;
    for offset in entry.data_offset..entry.data_end() {
        for bit in 0..8 {
            let mut tampered = bytes.clone();
            tampered[offset as usize] ^= 1 << bit;
            let container = Container::open(tampered).unwrap();
            match verify_entry(&container, SIGNATURE, BLOCK_MAP, &verifier, &VerifyLimits::default()) {
                // Some flips decode to the very same bytes.
                Ok(mut stream) => {
                    let mut replay = Vec::new();
                    stream.read_to_end(&mut replay).unwrap();
                    assert_eq!(replay, descriptor);
                }
                Err(Error::SignatureInvalid(_)) => rejected += 1,
                Err(other) => panic!("flipping bit {bit} at {offset} gave {other:?}"),
            }
        }
    }
    assert!(rejected > 0);
}
