use std::net::{IpAddr, UdpSocket};

/// IP интерфейса, через который машина оператора ходит наружу.
///
/// UDP connect ничего не отправляет, только выбирает маршрут.
/// None, если сети нет.
pub(crate) fn local_ip() -> Option<IpAddr> {
    let sock = UdpSocket::bind("0.0.0.0:0").ok()?;
    sock.connect("8.8.8.8:80").ok()?;
    let ip = sock.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_ip_is_never_unspecified() {
        if let Some(ip) = local_ip() {
            assert!(!ip.is_unspecified());
            assert!(ip.is_ipv4());
        }
    }
}
