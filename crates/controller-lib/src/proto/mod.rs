//! Wire types for the fleet controller
//!
//! Hand-maintained prost message definitions for the heartbeat datagram
//! sent by each cluster master and for the feedback RPC consumed by the
//! learning service. Keeping these in Rust avoids a protoc dependency at
//! build time; the tag layout is the wire contract and must not change.

pub mod fleet {
    pub mod v1 {
        use prost::Message;

        /// One telemetry report from a cluster master, delivered as a UDP
        /// datagram. Counters mirror the YARN resource-manager metrics the
        /// master scrapes between heartbeats.
        #[derive(Clone, PartialEq, Message)]
        pub struct Heartbeat {
            #[prost(string, tag = "1")]
            pub cluster_name: String,
            #[prost(int32, tag = "2")]
            pub number_of_nodes: i32,
            #[prost(int32, tag = "3")]
            pub allocated_mb: i32,
            #[prost(int32, tag = "4")]
            pub allocated_vcores: i32,
            #[prost(int32, tag = "5")]
            pub available_mb: i32,
            #[prost(int32, tag = "6")]
            pub available_vcores: i32,
            #[prost(int32, tag = "7")]
            pub pending_mb: i32,
            #[prost(int32, tag = "8")]
            pub pending_vcores: i32,
            #[prost(int32, tag = "9")]
            pub am_resource_limit_mb: i32,
            #[prost(int32, tag = "10")]
            pub am_resource_limit_vcores: i32,
            #[prost(int32, tag = "11")]
            pub used_am_resource_mb: i32,
            #[prost(int32, tag = "12")]
            pub used_am_resource_vcores: i32,
            #[prost(int32, tag = "13")]
            pub allocated_containers: i32,
            #[prost(int32, tag = "14")]
            pub pending_containers: i32,
            #[prost(int32, tag = "15")]
            pub aggregate_containers_allocated: i32,
            #[prost(int32, tag = "16")]
            pub aggregate_containers_released: i32,
            #[prost(int32, tag = "17")]
            pub aggregate_containers_preempted: i32,
            #[prost(int32, tag = "18")]
            pub apps_submitted: i32,
            #[prost(int32, tag = "19")]
            pub apps_running: i32,
            #[prost(int32, tag = "20")]
            pub apps_pending: i32,
            #[prost(int32, tag = "21")]
            pub apps_completed: i32,
            #[prost(int32, tag = "22")]
            pub apps_killed: i32,
            #[prost(int32, tag = "23")]
            pub apps_failed: i32,
            #[prost(int32, tag = "24")]
            pub active_applications: i32,
            #[prost(int64, tag = "25")]
            pub allocation_delay_num_ops: i64,
            #[prost(float, tag = "26")]
            pub allocation_delay_avg_ms: f32,
        }

        /// Before/after telemetry around one scaling decision, exported to
        /// the learning service so future policies can be trained on the
        /// observed effect.
        #[derive(Clone, PartialEq, Message)]
        pub struct FeedbackRecord {
            #[prost(int32, tag = "1")]
            pub nodes: i32,
            #[prost(int32, tag = "2")]
            pub scaling_factor: i32,
            #[prost(float, tag = "3")]
            pub performance_before: f32,
            #[prost(float, tag = "4")]
            pub performance_after: f32,
            #[prost(message, optional, tag = "5")]
            pub metrics_before: Option<Heartbeat>,
            #[prost(message, optional, tag = "6")]
            pub metrics_after: Option<Heartbeat>,
        }

        #[derive(Clone, PartialEq, Message)]
        pub struct CollectFeedbackResponse {
            #[prost(bool, tag = "1")]
            pub success: bool,
            #[prost(string, tag = "2")]
            pub message: String,
        }

        pub mod learning_service_client {
            use super::*;
            use tonic::codegen::*;

            /// Client for the learning service's feedback-collection RPC.
            #[derive(Debug, Clone)]
            pub struct LearningServiceClient<T> {
                inner: tonic::client::Grpc<T>,
            }

            impl LearningServiceClient<tonic::transport::Channel> {
                pub fn new(channel: tonic::transport::Channel) -> Self {
                    let inner = tonic::client::Grpc::new(channel);
                    Self { inner }
                }
            }

            impl<T> LearningServiceClient<T>
            where
                T: tonic::client::GrpcService<tonic::body::BoxBody>,
                T::Error: Into<StdError>,
                T::ResponseBody: Body<Data = Bytes> + Send + 'static,
                <T::ResponseBody as Body>::Error: Into<StdError> + Send,
            {
                pub async fn collect_feedback(
                    &mut self,
                    request: impl tonic::IntoRequest<FeedbackRecord>,
                ) -> Result<tonic::Response<CollectFeedbackResponse>, tonic::Status>
                {
                    self.inner.ready().await.map_err(|e| {
                        tonic::Status::new(
                            tonic::Code::Unknown,
                            format!("Service was not ready: {}", e.into()),
                        )
                    })?;
                    let codec = tonic::codec::ProstCodec::default();
                    let path = http::uri::PathAndQuery::from_static(
                        "/fleet.v1.LearningService/CollectFeedback",
                    );
                    self.inner.unary(request.into_request(), path, codec).await
                }
            }
        }
    }
}

pub use fleet::v1::learning_service_client::LearningServiceClient;
pub use fleet::v1::*;
