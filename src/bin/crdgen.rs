use kube::CustomResourceExt;
use revision_operator::crd::EnvoyConfigRevision;

fn main() {
    print!(
        "{}",
        serde_yaml::to_string(&EnvoyConfigRevision::crd()).unwrap()
    );
}
