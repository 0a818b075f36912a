use ethers::prelude::abigen;

abigen!(
    StakedRif,
    r#"[
        function balanceOf(address account) external view returns (uint256)
        function totalSupply() external view returns (uint256)
        function getVotes(address account) external view returns (uint256)
    ]"#
);
