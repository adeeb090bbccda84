//! route6ctl - in-process demo of the routing core's admin surface
//!
//! Drives a `Router` directly (no control socket, no NIC layer - both are
//! out of scope for the core) to show the master-first replication
//! protocol and dustbin reclamation end to end.

use route6::{DeviceRef, Flow6, IfName, InterfaceRegistry, Opcode, Route6Config, RouteConfig, Router};
use std::net::Ipv6Addr;
use std::sync::Arc;
use std::time::Instant;

/// A toy interface table: every name maps to a device, in insertion order.
struct DemoInterfaces {
    names: Vec<IfName>,
}

impl DemoInterfaces {
    fn new(names: &[&str]) -> Self {
        DemoInterfaces {
            names: names.iter().map(|n| IfName::new(n).expect("interface name too long")).collect(),
        }
    }
}

impl InterfaceRegistry for DemoInterfaces {
    fn interface_by_name(&self, name: &IfName) -> Option<DeviceRef> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|index| DeviceRef { index: index as u32, name: *name })
    }
}

fn add_route(router: &Router, addr: &str, plen: u8, gateway: &str, ifname: &str) {
    let req = RouteConfig {
        ops: Opcode::Add,
        dst: route6::Ipv6Prefix::new(addr.parse().unwrap(), plen).unwrap(),
        src: route6::Ipv6Prefix::default_route(),
        prefsrc: route6::Ipv6Prefix::default_route(),
        gateway: gateway.parse().unwrap(),
        ifname: IfName::new(ifname).unwrap(),
        mtu: 0,
        flags: route6::route_config::flags::USER_CONFIGURED,
    };
    match router.admin_apply(req) {
        Ok(seq) => println!("added {}/{} via {} (seq={})", addr, plen, ifname, seq),
        Err(err) => println!("failed to add {}/{}: {}", addr, plen, err),
    }
}

fn main() {
    route6::log::set_log_level(route6::log::LogLevel::Info);

    let interfaces = Arc::new(DemoInterfaces::new(&["eth0", "eth1"]));
    let config = Route6Config::new().method(route6::EngineKind::Lpm).num_workers(3);
    let router = Router::new(config, interfaces);

    println!("=== route6ctl demo: {} lcores, master=lcore{} ===\n", router.num_lcores(), Router::MASTER_LCORE);

    add_route(&router, "2001:db8::", 32, "::", "eth0");
    add_route(&router, "2001:db8:1::", 48, "fe80::1", "eth1");

    // The master applied locally, synchronously; slaves catch up once
    // they service their own mailbox (spec §4.4).
    for lcore in 1..router.num_lcores() as u32 {
        router.tick(lcore, Instant::now());
    }

    for lcore in 0..router.num_lcores() as u32 {
        let dump = router.admin_show(lcore, None);
        println!("lcore{}: {} route(s)", lcore, dump.len());
        for entry in &dump {
            println!("  {} via {:?} gw {}", entry.dst, entry.ifname, entry.gateway);
        }
    }

    let flow = Flow6::new("2001:db8:1::1".parse::<Ipv6Addr>().unwrap());
    match router.output(1, &flow) {
        Ok(hit) => {
            println!("\nlcore1 output lookup for {} hit {}", flow.dst, hit.get().dst);
            hit.release();
        }
        Err(err) => println!("\nlcore1 output lookup for {} failed: {}", flow.dst, err),
    }

    router.teardown_all();
    println!("\nshut down cleanly");
}
