/* demos/resolve.rs */

use remote_addr::{AddrResolver, TrustPolicy, resolve_remote_addr};
use std::net::SocketAddr;

fn main() {
    println!("=== Forwarded Address Resolution Examples ===\n");

    // Example 1: No header, fallback to the peer address
    example_1_fallback();

    // Example 2: Single entry in the chain
    example_2_single_entry();

    // Example 3: Trailing internal load-balancer hop
    example_3_skip_internal();

    // Example 4: The skip is not recursive
    example_4_non_recursive();

    // Example 5: CIDR trust policy
    example_5_cidr_policy();

    // Example 6: Walking a whole chain of trusted proxies
    example_6_walk_chain();

    println!("=== All examples completed! ===");
}

fn peer() -> SocketAddr {
    "192.0.2.1:8080".parse().unwrap()
}

fn example_1_fallback() {
    println!("Example 1: No header, fallback to the peer address");

    let resolved = resolve_remote_addr(None, peer());
    println!("Peer: {}", peer());
    println!("Resolved: {}", resolved);
    println!();
}

fn example_2_single_entry() {
    println!("Example 2: Single entry in the chain");

    let resolved = resolve_remote_addr(Some("203.0.113.7"), peer());
    println!("X-Forwarded-For: 203.0.113.7");
    println!("Resolved: {}", resolved);
    println!();
}

fn example_3_skip_internal() {
    println!("Example 3: Trailing internal load-balancer hop is skipped");

    let resolved = resolve_remote_addr(Some("203.0.113.7, 10.0.0.5"), peer());
    println!("X-Forwarded-For: 203.0.113.7, 10.0.0.5");
    println!("Resolved (hop before the balancer): {}", resolved);
    println!();
}

fn example_4_non_recursive() {
    println!("Example 4: Only one internal hop is ever skipped");

    let resolved = resolve_remote_addr(Some("10.0.0.9, 10.0.0.5"), peer());
    println!("X-Forwarded-For: 10.0.0.9, 10.0.0.5");
    println!("Resolved (prior hop, internal or not): {}", resolved);
    println!();
}

fn example_5_cidr_policy() {
    println!("Example 5: CIDR trust policy instead of the 10. prefix rule");

    let header = "203.0.113.7, 192.168.1.10";
    println!("X-Forwarded-For: {}", header);

    // The default prefix rule does not treat 192.168.1.10 as internal.
    let resolved = resolve_remote_addr(Some(header), peer());
    println!("Prefix rule result: {}", resolved);

    let resolver =
        AddrResolver::new().with_trust(TrustPolicy::from_cidrs(["192.168.0.0/16"]).unwrap());
    let resolved = resolver.resolve(Some(header), peer());
    println!("CIDR rule result: {}", resolved);
    println!();
}

fn example_6_walk_chain() {
    println!("Example 6: Walking a whole chain of trusted proxies");

    let header = "203.0.113.7, 10.0.0.5, 192.168.1.10, 127.0.0.1";
    println!("X-Forwarded-For: {}", header);

    // Single-step skip only steps back once.
    let resolved = resolve_remote_addr(Some(header), peer());
    println!("Single-step result: {}", resolved);

    // The private-ranges walk finds the first hop outside the trusted set.
    let resolver = AddrResolver::new()
        .with_trust(TrustPolicy::private_ranges())
        .skip_all_trusted(true);
    let resolved = resolver.resolve(Some(header), peer());
    println!("Full-walk result: {}", resolved);
    println!();
}
