#![no_main]

use libfuzzer_sys::fuzz_target;
use skillloop::storage::snapshot;
use skillloop::ProgramId;

fuzz_target!(|data: &[u8]| {
    let legacy = ProgramId::new("skillloop-ai-foundations");

    // Anything that decodes must survive a re-encode unchanged.
    if let Ok(decoded) = snapshot::decode(data, &legacy) {
        let bytes = snapshot::encode(&decoded.state).unwrap();
        let again = snapshot::decode(&bytes, &legacy).unwrap();
        assert_eq!(again.state, decoded.state);
        assert_eq!(again.migrated_from, None);
    }
});
