use parley_core::{Configuration, IceCandidate, SdpType, SignalingState};
use parley_peer::WebRtcPeer;

use crate::integration::init_tracing;
use crate::utils::{negotiate, next_item};

async fn create_peer() -> WebRtcPeer {
    WebRtcPeer::new(Configuration::default())
        .await
        .expect("Failed to create WebRTC peer")
}

#[tokio::test]
async fn test_webrtc_offer() {
    init_tracing();

    let a = create_peer().await;
    let mut states = a.signaling_states();

    a.create_data_channel("data", None)
        .await
        .expect("Failed to create data channel");
    let offer = a.create_offer(None).await.expect("Failed to create offer");

    assert_eq!(offer.sdp_type, SdpType::Offer);
    assert!(offer.sdp.contains("v=0"));
    assert!(offer.sdp.contains("webrtc-datachannel"));
    assert_eq!(
        next_item(&mut states).await.unwrap(),
        SignalingState::HaveLocalOffer
    );

    a.close().await;
}

#[tokio::test]
async fn test_webrtc_peers_negotiate_to_stable() {
    init_tracing();

    let a = create_peer().await;
    let b = create_peer().await;
    let mut a_states = a.signaling_states();
    let mut b_states = b.signaling_states();

    a.create_data_channel("data", None).await.unwrap();

    let (_, answer) = negotiate(&a, &b).await.expect("Negotiation failed");

    assert_eq!(answer.sdp_type, SdpType::Answer);
    assert_eq!(a.signaling_state(), SignalingState::Stable);
    assert_eq!(b.signaling_state(), SignalingState::Stable);

    assert_eq!(next_item(&mut a_states).await.unwrap(), SignalingState::HaveLocalOffer);
    assert_eq!(next_item(&mut a_states).await.unwrap(), SignalingState::Stable);
    assert_eq!(next_item(&mut b_states).await.unwrap(), SignalingState::HaveRemoteOffer);
    assert_eq!(next_item(&mut b_states).await.unwrap(), SignalingState::Stable);

    let remote = a.remote_description().await.expect("Offerer has no remote description");
    assert_eq!(remote.sdp_type, SdpType::Answer);

    // Trickled after negotiation finished.
    a.add_candidate(
        IceCandidate::new("candidate:1 1 udp 2130706431 192.0.2.10 50000 typ host")
            .with_mid("0", 0),
    )
    .await
    .expect("Trickled candidate should be accepted");

    a.close().await;
    b.close().await;
}

#[tokio::test]
async fn test_webrtc_close_is_terminal() {
    init_tracing();

    let a = create_peer().await;

    a.close().await;
    a.close().await;

    assert_eq!(a.signaling_state(), SignalingState::Closed);
    assert!(a.create_offer(None).await.unwrap_err().is_closed());
    assert!(matches!(
        a.create_data_channel("late", None).await,
        Err(e) if e.is_closed()
    ));
}
