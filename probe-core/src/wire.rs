use crate::constants::{REQUEST_FRAME_LEN, REQUEST_SIGNATURE};
use crate::error::WireError;
use crate::types::TestRequest;

/// Кадр запроса: "ABC" | depth i32 LE | duration i32 LE | save u8
pub fn encode(req: &TestRequest) -> [u8; REQUEST_FRAME_LEN] {
    let mut out = [0u8; REQUEST_FRAME_LEN];
    out[..3].copy_from_slice(REQUEST_SIGNATURE);
    out[3..7].copy_from_slice(&req.depth_m.to_le_bytes());
    out[7..11].copy_from_slice(&req.duration_min.to_le_bytes());
    out[11] = u8::from(req.save);
    out
}

/// Обратная операция, нужна симулятору прибора.
/// Байты после 12-го игнорируются.
pub fn decode(buf: &[u8]) -> Result<TestRequest, WireError> {
    if buf.len() < REQUEST_FRAME_LEN {
        return Err(WireError::FrameTooShort(buf.len()));
    }

    let mut sig = [0u8; 3];
    sig.copy_from_slice(&buf[..3]);
    if &sig != REQUEST_SIGNATURE {
        return Err(WireError::BadSignature(sig));
    }

    let mut int = [0u8; 4];
    int.copy_from_slice(&buf[3..7]);
    let depth_m = i32::from_le_bytes(int);
    int.copy_from_slice(&buf[7..11]);
    let duration_min = i32::from_le_bytes(int);

    let save = match buf[11] {
        0 => false,
        1 => true,
        other => return Err(WireError::BadSaveFlag(other)),
    };

    Ok(TestRequest {
        depth_m,
        duration_min,
        save,
    })
}
